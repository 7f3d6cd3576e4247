//! Generates the error enums returned by driven ports.
//!
//! Every port failure in this crate is a collaborator-supplied message tagged
//! with the operation that failed. Each variant names the operation and its
//! display prefix:
//!
//! ```text
//! define_port_error! {
//!     /// Errors raised by the node store.
//!     pub enum NodeStoreError {
//!         /// The node could not be written.
//!         Write => "node store write failed",
//!     }
//! }
//! ```
//!
//! expands to `NodeStoreError::Write { message }` displaying as
//! `node store write failed: <message>`, a `write(message)` constructor, and a
//! `message()` accessor shared by all variants.

macro_rules! define_port_error {
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $prefix:literal
            ),+ $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error("{}: {message}", $prefix)]
                $variant {
                    /// Detail reported by the collaborator.
                    message: String,
                },
            )+
        }

        impl $name {
            $(
                ::paste::paste! {
                    #[doc = concat!("Construct [`Self::", stringify!($variant), "`].")]
                    pub fn [<$variant:snake>](message: impl Into<String>) -> Self {
                        Self::$variant {
                            message: message.into(),
                        }
                    }
                }
            )+

            /// Detail reported by the collaborator, without the operation
            /// prefix.
            pub fn message(&self) -> &str {
                match self {
                    $(Self::$variant { message })|+ => message.as_str(),
                }
            }
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    //! Generated port error behaviour.

    define_port_error! {
        /// Lookup failures.
        pub enum LookupError {
            /// Read failed.
            Read => "lookup read failed",
            /// Remote timed out.
            RemoteTimeout => "lookup timed out",
        }
    }

    define_port_error! {
        /// Single-variant errors.
        pub enum RejectError {
            /// Rejected.
            Rejected => "rejected",
        }
    }

    #[test]
    fn display_prefixes_the_collaborator_message() {
        assert_eq!(
            LookupError::read("disk offline").to_string(),
            "lookup read failed: disk offline"
        );
    }

    #[test]
    fn constructors_use_snake_case_variant_names() {
        let err = LookupError::remote_timeout(String::from("after 30s"));
        assert_eq!(
            err,
            LookupError::RemoteTimeout {
                message: "after 30s".to_owned()
            }
        );
    }

    #[test]
    fn message_omits_the_prefix_for_every_variant() {
        assert_eq!(LookupError::read("a").message(), "a");
        assert_eq!(LookupError::remote_timeout("b").message(), "b");
        assert_eq!(RejectError::rejected("c").message(), "c");
    }
}
