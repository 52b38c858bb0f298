//! Sample application used by the demos and end-to-end tests.
//!
//! Members, discount policies and orders are ordinary consumers of the
//! container. [`wiring::register_app`] plays the configuration collaborator:
//! it only calls `register`.

pub mod discount;
pub mod member;
pub mod network;
pub mod order;
pub mod request_log;
pub mod wiring;

pub use discount::{DiscountPolicy, FixDiscountPolicy, RateDiscountPolicy};
pub use member::{Grade, Member, MemberRepository, MemberService, MemberServiceImpl, MemoryMemberRepository};
pub use network::NetworkClient;
pub use order::{Order, OrderError, OrderService, OrderServiceImpl};
pub use request_log::{LogDemoService, RequestLog};
pub use wiring::{register_app, register_scanned_app, NETWORK_URL, REQUEST_SCOPE};
