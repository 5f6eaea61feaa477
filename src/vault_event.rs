/// Events emitted by a vault during singleton lifecycle operations.
///
/// These events are passed to the tracing callback set via `set_trace_callback`.
/// The `Clone` derive allows callbacks to store or forward events if needed.
///
/// # Examples
///
/// ```rust
/// use singleton_vault::VaultEvent;
///
/// let event = VaultEvent::Construct { type_name: "i32" };
/// assert_eq!(event.to_string(), "construct { type_name: i32 }");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultEvent {
    /// A slot was created for a (type, tag) pair the vault had not seen before.
    Locate {
        /// The type name of the singleton (e.g., "i32", "alloc::string::String")
        type_name: &'static str,
    },

    /// The factory of a slot returned and the instance is live.
    Construct {
        /// The type name of the constructed singleton
        type_name: &'static str,
    },

    /// A constructed slot was appended to the teardown order.
    Register {
        /// The type name of the registered singleton
        type_name: &'static str,
        /// Zero-based position in construction order
        position: usize,
    },

    /// A guard was handed out.
    Acquire {
        /// The type name of the guarded singleton
        type_name: &'static str,
        /// Whether the instance was already live (false means this call constructed it)
        found_live: bool,
    },

    /// A factory re-entered its own slot.
    RecursiveInitialization {
        /// The type name of the slot under construction
        type_name: &'static str,
    },

    /// A second handle was declared for an already owned slot.
    DuplicatedSingleton {
        /// The type name of the contested slot
        type_name: &'static str,
    },

    /// An acquire hit a slot that is being or has been destroyed.
    UseAfterDestroy {
        /// The type name of the destroyed slot
        type_name: &'static str,
    },

    /// A slot dropped its instance.
    Destroy {
        /// The type name of the destroyed singleton
        type_name: &'static str,
    },

    /// The vault finished tearing down.
    Teardown {
        /// Number of constructed slots that were destroyed
        count: usize,
    },
}

impl std::fmt::Display for VaultEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VaultEvent::Locate { type_name } => write!(f, "locate {{ type_name: {type_name} }}"),
            VaultEvent::Construct { type_name } => {
                write!(f, "construct {{ type_name: {type_name} }}")
            }
            VaultEvent::Register {
                type_name,
                position,
            } => write!(
                f,
                "register {{ type_name: {type_name}, position: {position} }}"
            ),
            VaultEvent::Acquire {
                type_name,
                found_live,
            } => write!(
                f,
                "acquire {{ type_name: {type_name}, found_live: {found_live} }}"
            ),
            VaultEvent::RecursiveInitialization { type_name } => {
                write!(f, "recursive_initialization {{ type_name: {type_name} }}")
            }
            VaultEvent::DuplicatedSingleton { type_name } => {
                write!(f, "duplicated_singleton {{ type_name: {type_name} }}")
            }
            VaultEvent::UseAfterDestroy { type_name } => {
                write!(f, "use_after_destroy {{ type_name: {type_name} }}")
            }
            VaultEvent::Destroy { type_name } => write!(f, "destroy {{ type_name: {type_name} }}"),
            VaultEvent::Teardown { count } => write!(f, "Tearing down the Vault ({count} slots)"),
        }
    }
}
