//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing an `AccountId` where a
//! `MemberProfileId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

typed_id!(UserId, "Unique identifier for an operator (employee user).");
typed_id!(OrganizationId, "Unique identifier for a cooperative organization.");
typed_id!(BranchId, "Unique identifier for a branch within an organization.");
typed_id!(AccountId, "Unique identifier for a general ledger account.");
typed_id!(MemberProfileId, "Unique identifier for a member profile.");
typed_id!(MemberTypeId, "Unique identifier for a member type.");
typed_id!(SavingsAccountId, "Unique identifier for a member's savings account.");
typed_id!(LedgerEntryId, "Unique identifier for a ledger entry.");
typed_id!(TransactionId, "Unique identifier for a teller transaction.");
typed_id!(TransactionBatchId, "Unique identifier for a teller transaction batch.");
typed_id!(AccrualBatchId, "Unique identifier for a savings-interest accrual batch.");
typed_id!(AccrualEntryId, "Unique identifier for a staged accrual entry.");
typed_id!(DistributionBatchId, "Unique identifier for a mutual-fund distribution batch.");
typed_id!(BeneficiaryId, "Unique identifier for an additional beneficiary group.");
typed_id!(AmountRowId, "Unique identifier for a distribution amount table row.");
typed_id!(DistributionEntryId, "Unique identifier for a computed distribution entry.");
