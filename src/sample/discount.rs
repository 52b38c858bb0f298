use super::member::{Grade, Member};

pub trait DiscountPolicy: Send + Sync {
    /// Amount taken off `price` for `member`.
    fn discount(&self, member: &Member, price: u64) -> u64;
}

/// Flat 1000 off for VIP members.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixDiscountPolicy;

impl FixDiscountPolicy {
    pub const DISCOUNT_AMOUNT: u64 = 1000;
}

impl DiscountPolicy for FixDiscountPolicy {
    fn discount(&self, member: &Member, price: u64) -> u64 {
        match member.grade {
            Grade::Vip => Self::DISCOUNT_AMOUNT.min(price),
            Grade::Basic => 0,
        }
    }
}

/// 10% off for VIP members.
#[derive(Debug, Clone, Copy, Default)]
pub struct RateDiscountPolicy;

impl RateDiscountPolicy {
    pub const DISCOUNT_PERCENT: u64 = 10;
}

impl DiscountPolicy for RateDiscountPolicy {
    fn discount(&self, member: &Member, price: u64) -> u64 {
        match member.grade {
            Grade::Vip => price * Self::DISCOUNT_PERCENT / 100,
            Grade::Basic => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_discount_for_vip() {
        let vip = Member::new(1, "memberVIP", Grade::Vip);
        assert_eq!(RateDiscountPolicy.discount(&vip, 10000), 1000);
        assert_eq!(RateDiscountPolicy.discount(&vip, 20000), 2000);
    }

    #[test]
    fn test_no_discount_for_basic() {
        let basic = Member::new(2, "memberBASIC", Grade::Basic);
        assert_eq!(RateDiscountPolicy.discount(&basic, 10000), 0);
        assert_eq!(FixDiscountPolicy.discount(&basic, 10000), 0);
    }

    #[test]
    fn test_fix_discount_for_vip() {
        let vip = Member::new(1, "memberVIP", Grade::Vip);
        assert_eq!(FixDiscountPolicy.discount(&vip, 10000), 1000);
        assert_eq!(FixDiscountPolicy.discount(&vip, 500), 500);
    }
}
