//! The CardDAV backend façade.

use chrono::{DateTime, Utc};

use almanac_core::constants::DEFAULT_MAX_RESOURCE_SIZE;
use almanac_db::db::connection::DbConnection;
use almanac_db::db::query::carddav::{card, folder};
use almanac_db::model::carddav::folder::NewAddressbookFolder;
use almanac_rfc::vcard::core::VCard;

use crate::caldav::path;
use crate::caldav::precondition::Preconditions;
use crate::error::{ServiceError, ServiceResult};

use super::object::{self, LoadedCard, PutCardOutcome};

/// An addressbook collection descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressbookDescriptor {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub max_resource_size: i64,
}

/// An address object with its collection-relative address.
#[derive(Debug, Clone)]
pub struct AddressObject {
    pub path: String,
    pub uid: uuid::Uuid,
    pub etag: String,
    pub modified_at: DateTime<Utc>,
    pub size: i64,
    pub data: VCard,
    pub body: String,
}

/// The CardDAV backend: addressbook and card operations.
#[derive(Debug, Clone)]
pub struct AddressbookBackend {
    prefix: String,
}

impl AddressbookBackend {
    /// Creates a backend serving addressbooks under the given prefix.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// ## Summary
    /// The principal-relative home set path, `/{principal}/{prefix}/`.
    ///
    /// ## Errors
    /// Returns `NotAuthenticated` when no principal is present.
    pub fn addressbook_home_set_path(&self, principal: Option<&str>) -> ServiceResult<String> {
        let principal = principal.ok_or(ServiceError::NotAuthenticated)?;
        Ok(format!("/{principal}/{}/", self.prefix))
    }

    /// ## Summary
    /// Creates an addressbook collection.
    ///
    /// ## Errors
    /// Returns an error if the insert fails.
    pub async fn create_addressbook(
        &self,
        conn: &mut DbConnection<'_>,
        name: &str,
        description: Option<&str>,
    ) -> ServiceResult<AddressbookDescriptor> {
        let id = folder::create(
            conn,
            &NewAddressbookFolder {
                name,
                description,
                types: vec!["text/vcard".to_string()],
                max_size: DEFAULT_MAX_RESOURCE_SIZE,
            },
        )
        .await?;

        Ok(AddressbookDescriptor {
            id,
            name: name.to_string(),
            description: description.map(str::to_string),
            max_resource_size: DEFAULT_MAX_RESOURCE_SIZE,
        })
    }

    /// ## Summary
    /// Lists the addressbooks of a principal with home-set-relative
    /// paths.
    ///
    /// ## Errors
    /// Returns an error if the query fails.
    pub async fn list_addressbooks(
        &self,
        conn: &mut DbConnection<'_>,
        principal: Option<&str>,
    ) -> ServiceResult<Vec<(String, AddressbookDescriptor)>> {
        let home_set = self.addressbook_home_set_path(principal)?;
        let folders = folder::list(conn).await?;
        Ok(folders
            .into_iter()
            .map(|f| {
                (
                    format!("{home_set}{}/", f.id),
                    AddressbookDescriptor {
                        id: f.id,
                        name: f.name,
                        description: f.description,
                        max_resource_size: f.max_size,
                    },
                )
            })
            .collect())
    }

    /// ## Summary
    /// Loads one address object by path.
    ///
    /// ## Errors
    /// Returns `NotFound` for unknown objects or non-UUID path stems.
    pub async fn get_address_object(
        &self,
        conn: &mut DbConnection<'_>,
        principal: Option<&str>,
        object_path: &str,
    ) -> ServiceResult<AddressObject> {
        let uid = path::object_uid(object_path)?;
        let loaded = object::get_address_object(conn, uid).await?;
        self.to_object(principal, loaded)
    }

    /// ## Summary
    /// Lists every object of an addressbook.
    ///
    /// ## Errors
    /// Returns `NotFound` for unknown collections.
    pub async fn list_address_objects(
        &self,
        conn: &mut DbConnection<'_>,
        principal: Option<&str>,
        collection_path: &str,
    ) -> ServiceResult<Vec<AddressObject>> {
        let folder_id = path::folder_id(collection_path)?;
        folder::get(conn, folder_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("addressbook {folder_id}")))?;

        let cards = card::list_by_folder(conn, folder_id).await?;

        let mut objects = Vec::with_capacity(cards.len());
        for row in cards {
            let loaded = object::get_address_object(conn, row.uid).await?;
            objects.push(self.to_object(principal, loaded)?);
        }
        Ok(objects)
    }

    /// ## Summary
    /// Validates and stores an address object; the stored file name is
    /// always `{uid}.vcf`.
    ///
    /// ## Errors
    /// Propagates validation and precondition failures.
    pub async fn put_address_object(
        &self,
        conn: &mut DbConnection<'_>,
        principal: Option<&str>,
        object_path: &str,
        vcard: &VCard,
        preconditions: Preconditions,
    ) -> ServiceResult<(String, PutCardOutcome)> {
        let folder_id = path::folder_id(object_path)?;
        let outcome = object::put_address_object(conn, folder_id, vcard, preconditions).await?;

        let home_set = self.addressbook_home_set_path(principal)?;
        let stored_path = path::object_path(&home_set, folder_id, outcome.uid, ".vcf");
        Ok((stored_path, outcome))
    }

    /// ## Summary
    /// Deletes an address object by path.
    ///
    /// ## Errors
    /// Returns `NotFound` when nothing is stored at the path.
    pub async fn delete_address_object(
        &self,
        conn: &mut DbConnection<'_>,
        object_path: &str,
    ) -> ServiceResult<()> {
        let uid = path::object_uid(object_path)?;
        object::delete_address_object(conn, uid).await
    }

    fn to_object(
        &self,
        principal: Option<&str>,
        loaded: LoadedCard,
    ) -> ServiceResult<AddressObject> {
        let home_set = self.addressbook_home_set_path(principal)?;
        Ok(AddressObject {
            path: path::object_path(&home_set, loaded.folder_id, loaded.uid, ".vcf"),
            uid: loaded.uid,
            etag: loaded.etag,
            modified_at: loaded.modified_at,
            size: loaded.size,
            data: loaded.card,
            body: loaded.body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn home_set_requires_principal() {
        let backend = AddressbookBackend::new("contacts");
        assert!(backend.addressbook_home_set_path(None).is_err());
        assert_eq!(
            backend.addressbook_home_set_path(Some("alice")).unwrap(),
            "/alice/contacts/"
        );
    }
}
