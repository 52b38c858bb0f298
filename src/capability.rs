//! Capability keys used for bean lookup.

use std::any::TypeId;
use std::fmt;

/// A type or trait that a bean satisfies.
///
/// Capabilities identify both concrete types (`MemoryMemberRepository`) and
/// trait objects (`dyn MemberRepository`). Lookup compares the `TypeId` only;
/// the type name is carried for diagnostics and error messages.
///
/// # Examples
///
/// ```rust
/// use beanpod::Capability;
///
/// trait Greeter: Send + Sync {}
///
/// let concrete = Capability::of::<String>();
/// let object = Capability::of::<dyn Greeter>();
///
/// assert_eq!(concrete.name(), "alloc::string::String");
/// assert!(object.name().contains("Greeter"));
/// assert_ne!(concrete, object);
/// assert_eq!(object, Capability::of::<dyn Greeter>());
/// ```
#[derive(Clone, Copy)]
pub struct Capability {
    type_id: TypeId,
    name: &'static str,
}

impl Capability {
    /// Capability key for `C`, which may be unsized (`dyn Trait`).
    #[inline(always)]
    pub fn of<C: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<C>(),
            name: std::any::type_name::<C>(),
        }
    }

    /// The `std::any::type_name` of the capability.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }
}

// TypeId-only comparison; the name is diagnostic
impl PartialEq for Capability {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for Capability {}

impl std::hash::Hash for Capability {
    #[inline(always)]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Capability({})", self.name)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
