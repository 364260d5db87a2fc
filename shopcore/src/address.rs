//! Address book: per-user delivery addresses with a single-default invariant.
//!
//! The store persists a user's whole address list as one versioned write, so
//! clearing the old default and setting the new one is a single atomic save.
//! Wire field names follow the storefront API: `type`, `address`, `pincode`,
//! `isDefault`.

use crate::errors::{CoreError, CoreResult, StorageError, StorageResult};
use crate::types::{AddressId, UserId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

const SAVE_RETRIES: u32 = 3;

/// A saved delivery address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Address identifier.
    pub id: AddressId,
    /// Type label, e.g. "Home" or "Work".
    #[serde(rename = "type")]
    pub label: String,
    /// Free-text address line.
    #[serde(rename = "address")]
    pub line: String,
    /// City, if given.
    #[serde(default)]
    pub city: Option<String>,
    /// State, if given.
    #[serde(default)]
    pub state: Option<String>,
    /// Postal code, if given.
    #[serde(rename = "pincode", default)]
    pub postal_code: Option<String>,
    /// Whether this is the preferred delivery address. At most one per user.
    #[serde(rename = "isDefault", default)]
    pub is_default: bool,
}

impl Address {
    /// Copies the deliverable fields into an order-bound snapshot.
    pub fn to_delivery(&self) -> DeliveryAddress {
        DeliveryAddress {
            label: self.label.clone(),
            line: self.line.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            postal_code: self.postal_code.clone(),
        }
    }
}

/// Address snapshot frozen onto an order at creation time. Later edits to the
/// address book never affect placed orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryAddress {
    /// Type label, required.
    #[serde(rename = "type")]
    pub label: String,
    /// Free-text address line, required.
    #[serde(rename = "address")]
    pub line: String,
    /// City, if given.
    #[serde(default)]
    pub city: Option<String>,
    /// State, if given.
    #[serde(default)]
    pub state: Option<String>,
    /// Postal code, if given.
    #[serde(rename = "pincode", default)]
    pub postal_code: Option<String>,
}

impl DeliveryAddress {
    /// Checks that the type label and address line are present and non-empty.
    pub fn validated(&self) -> CoreResult<()> {
        if self.label.trim().is_empty() {
            return Err(CoreError::ValidationFailed(
                "address type is required".to_string(),
            ));
        }
        if self.line.trim().is_empty() {
            return Err(CoreError::ValidationFailed(
                "address is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Input for adding a new address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAddress {
    /// Type label, required.
    #[serde(rename = "type")]
    pub label: String,
    /// Free-text address line, required.
    #[serde(rename = "address")]
    pub line: String,
    /// City, if given.
    #[serde(default)]
    pub city: Option<String>,
    /// State, if given.
    #[serde(default)]
    pub state: Option<String>,
    /// Postal code, if given.
    #[serde(rename = "pincode", default)]
    pub postal_code: Option<String>,
    /// Whether the new address becomes the default.
    #[serde(rename = "isDefault", default)]
    pub is_default: bool,
}

/// Partial update for an existing address; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressPatch {
    /// New type label.
    #[serde(rename = "type", default)]
    pub label: Option<String>,
    /// New address line.
    #[serde(rename = "address", default)]
    pub line: Option<String>,
    /// New city.
    #[serde(default)]
    pub city: Option<String>,
    /// New state.
    #[serde(default)]
    pub state: Option<String>,
    /// New postal code.
    #[serde(rename = "pincode", default)]
    pub postal_code: Option<String>,
    /// Setting `true` makes this address the single default.
    #[serde(rename = "isDefault", default)]
    pub is_default: Option<bool>,
}

/// Persistence seam for address lists.
///
/// The whole list is written in one versioned save so the single-default
/// invariant cannot be observed half-applied.
#[async_trait]
pub trait AddressStore: Send + Sync {
    /// Loads the user's addresses with the list's current version.
    /// A user with no saved addresses yields an empty list at version 0.
    async fn load(&self, user: UserId) -> StorageResult<(Vec<Address>, u64)>;

    /// Persists the list, checking `expected_version`; returns the new one.
    async fn save(
        &self,
        user: UserId,
        addresses: &[Address],
        expected_version: u64,
    ) -> StorageResult<u64>;
}

/// Address book operations.
#[derive(Clone)]
pub struct AddressBook {
    addresses: Arc<dyn AddressStore>,
}

impl std::fmt::Debug for AddressBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddressBook").finish_non_exhaustive()
    }
}

impl AddressBook {
    /// Creates the service over its store seam.
    pub fn new(addresses: Arc<dyn AddressStore>) -> Self {
        Self { addresses }
    }

    /// Returns the user's addresses in insertion order.
    #[instrument(skip(self))]
    pub async fn list(&self, user: UserId) -> CoreResult<Vec<Address>> {
        let (addresses, _) = self.addresses.load(user).await?;
        Ok(addresses)
    }

    /// Appends a new address. If it is marked default, every other address
    /// loses its default flag in the same save.
    #[instrument(skip(self, new))]
    pub async fn add(&self, user: UserId, new: NewAddress) -> CoreResult<Vec<Address>> {
        if new.label.trim().is_empty() {
            return Err(CoreError::ValidationFailed(
                "address type is required".to_string(),
            ));
        }
        if new.line.trim().is_empty() {
            return Err(CoreError::ValidationFailed(
                "address is required".to_string(),
            ));
        }

        self.mutate(user, |addresses| {
            if new.is_default {
                for addr in addresses.iter_mut() {
                    addr.is_default = false;
                }
            }
            addresses.push(Address {
                id: AddressId::new(),
                label: new.label.clone(),
                line: new.line.clone(),
                city: new.city.clone(),
                state: new.state.clone(),
                postal_code: new.postal_code.clone(),
                is_default: new.is_default,
            });
            Ok(())
        })
        .await
    }

    /// Merges the provided fields into an existing address. Setting
    /// `isDefault` clears the flag on every other address atomically.
    #[instrument(skip(self, patch))]
    pub async fn update(
        &self,
        user: UserId,
        id: AddressId,
        patch: AddressPatch,
    ) -> CoreResult<Vec<Address>> {
        if matches!(&patch.label, Some(label) if label.trim().is_empty()) {
            return Err(CoreError::ValidationFailed(
                "address type cannot be empty".to_string(),
            ));
        }
        if matches!(&patch.line, Some(line) if line.trim().is_empty()) {
            return Err(CoreError::ValidationFailed(
                "address cannot be empty".to_string(),
            ));
        }

        self.mutate(user, |addresses| {
            let pos = addresses
                .iter()
                .position(|addr| addr.id == id)
                .ok_or_else(|| CoreError::not_found("address", id))?;

            if patch.is_default == Some(true) {
                for (i, addr) in addresses.iter_mut().enumerate() {
                    if i != pos {
                        addr.is_default = false;
                    }
                }
            }

            let addr = addresses
                .get_mut(pos)
                .ok_or_else(|| CoreError::Internal("address vanished".to_string()))?;
            if let Some(label) = &patch.label {
                addr.label = label.clone();
            }
            if let Some(line) = &patch.line {
                addr.line = line.clone();
            }
            if let Some(city) = &patch.city {
                addr.city = Some(city.clone());
            }
            if let Some(state) = &patch.state {
                addr.state = Some(state.clone());
            }
            if let Some(postal) = &patch.postal_code {
                addr.postal_code = Some(postal.clone());
            }
            if let Some(default) = patch.is_default {
                addr.is_default = default;
            }
            Ok(())
        })
        .await
    }

    /// Removes an address. Removing the default leaves the user with zero
    /// defaults; no re-election happens.
    #[instrument(skip(self))]
    pub async fn remove(&self, user: UserId, id: AddressId) -> CoreResult<Vec<Address>> {
        self.mutate(user, |addresses| {
            if !addresses.iter().any(|addr| addr.id == id) {
                return Err(CoreError::not_found("address", id));
            }
            addresses.retain(|addr| addr.id != id);
            Ok(())
        })
        .await
    }

    async fn mutate<F>(&self, user: UserId, mut mutate: F) -> CoreResult<Vec<Address>>
    where
        F: FnMut(&mut Vec<Address>) -> CoreResult<()>,
    {
        let mut attempts = 0;
        loop {
            let (mut addresses, version) = self.addresses.load(user).await?;
            mutate(&mut addresses)?;
            match self.addresses.save(user, &addresses, version).await {
                Ok(_) => return Ok(addresses),
                Err(err @ StorageError::VersionConflict { .. }) => {
                    attempts += 1;
                    if attempts >= SAVE_RETRIES {
                        return Err(err.into());
                    }
                    debug!(user = %user, attempts, "address version conflict, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}
