//! The CalDAV backend façade the WebDAV handlers consume.
//!
//! Every operation is stateless between calls; all state lives in the
//! store. Paths follow `/{principal}/{prefix}/{folder_id}/{uid}.ics`.

use chrono::{DateTime, Utc};

use almanac_db::db::connection::DbConnection;
use almanac_rfc::ical::core::{ComponentKind, ICalendar};

use crate::error::{ServiceError, ServiceResult};

use super::folder::{CalendarDescriptor, CreateCalendarRequest};
use super::object::{LoadedObject, PutOutcome};
use super::path;
use super::precondition::Preconditions;
use super::{folder, object};

/// A calendar object with its collection-relative address.
#[derive(Debug, Clone)]
pub struct CalendarObject {
    pub path: String,
    pub uid: uuid::Uuid,
    pub etag: String,
    pub modified_at: DateTime<Utc>,
    pub size: i64,
    pub data: ICalendar,
    /// Canonical encoding of `data`.
    pub body: String,
}

/// A calendar-query filter: component kind plus an optional UTC time
/// range the component's span must overlap.
#[derive(Debug, Clone, Default)]
pub struct CalendarQuery {
    pub component: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// The CalDAV backend: the operation set the WebDAV layer calls into.
#[derive(Debug, Clone)]
pub struct CalendarBackend {
    /// Principal-relative prefix the calendar tree is mounted under.
    prefix: String,
}

impl CalendarBackend {
    /// Creates a backend serving calendars under the given prefix.
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
    pub fn calendar_home_set_path(&self, principal: Option<&str>) -> ServiceResult<String> {
        let principal = principal.ok_or(ServiceError::NotAuthenticated)?;
        Ok(format!("/{principal}/{}/", self.prefix))
    }

    /// ## Summary
    /// Lists the calendars of a principal, with home-set-relative paths.
    ///
    /// ## Errors
    /// Returns an error if the query fails.
    pub async fn list_calendars(
        &self,
        conn: &mut DbConnection<'_>,
        principal: Option<&str>,
    ) -> ServiceResult<Vec<(String, CalendarDescriptor)>> {
        let home_set = self.calendar_home_set_path(principal)?;
        let calendars = folder::list_calendars(conn).await?;
        Ok(calendars
            .into_iter()
            .map(|c| (format!("{home_set}{}/", c.id), c))
            .collect())
    }

    /// ## Summary
    /// Resolves a collection path to its descriptor.
    ///
    /// ## Errors
    /// Returns `NotFound` for unknown collections.
    pub async fn get_calendar(
        &self,
        conn: &mut DbConnection<'_>,
        collection_path: &str,
    ) -> ServiceResult<CalendarDescriptor> {
        let id = path::folder_id(collection_path)?;
        folder::get_calendar(conn, id).await
    }

    /// ## Summary
    /// Creates a calendar collection.
    ///
    /// ## Errors
    /// Returns an error if the insert fails.
    pub async fn create_calendar(
        &self,
        conn: &mut DbConnection<'_>,
        request: CreateCalendarRequest,
    ) -> ServiceResult<CalendarDescriptor> {
        folder::create_calendar(conn, request).await
    }

    /// ## Summary
    /// Loads one calendar object by path.
    ///
    /// ## Errors
    /// Returns `NotFound` for unknown objects or non-UUID path stems.
    pub async fn get_calendar_object(
        &self,
        conn: &mut DbConnection<'_>,
        principal: Option<&str>,
        object_path: &str,
    ) -> ServiceResult<CalendarObject> {
        let uid = path::object_uid(object_path)?;
        let loaded = object::get_calendar_object(conn, uid).await?;
        self.to_object(principal, loaded)
    }

    /// ## Summary
    /// Lists every object of a collection.
    ///
    /// ## Errors
    /// Returns `NotFound` for unknown collections.
    pub async fn list_calendar_objects(
        &self,
        conn: &mut DbConnection<'_>,
        principal: Option<&str>,
        collection_path: &str,
    ) -> ServiceResult<Vec<CalendarObject>> {
        let folder_id = path::folder_id(collection_path)?;
        folder::get_calendar(conn, folder_id).await?;

        let files =
            almanac_db::db::query::caldav::file::list_by_folder(conn, folder_id).await?;

        let mut objects = Vec::with_capacity(files.len());
        for file in files {
            let loaded = object::get_calendar_object(conn, file.uid).await?;
            objects.push(self.to_object(principal, loaded)?);
        }
        Ok(objects)
    }

    /// ## Summary
    /// Lists the objects of a collection that match a calendar-query.
    ///
    /// ## Errors
    /// Returns `InvalidQuery` for unknown component filters.
    pub async fn query_calendar_objects(
        &self,
        conn: &mut DbConnection<'_>,
        principal: Option<&str>,
        collection_path: &str,
        query: &CalendarQuery,
    ) -> ServiceResult<Vec<CalendarObject>> {
        let kind = query
            .component
            .as_deref()
            .map(|name| {
                let kind = ComponentKind::parse(name);
                if kind.is_stored() {
                    Ok(kind)
                } else {
                    Err(ServiceError::InvalidQuery(format!(
                        "unsupported component filter: {name}"
                    )))
                }
            })
            .transpose()?;

        let objects = self
            .list_calendar_objects(conn, principal, collection_path)
            .await?;

        Ok(objects
            .into_iter()
            .filter(|obj| matches_query(obj, kind, query))
            .collect())
    }

    /// ## Summary
    /// Validates and stores a calendar object. The stored path segment is
    /// always `{uid}.ics`, whatever the request path said.
    ///
    /// ## Errors
    /// Propagates validation and precondition failures; the write is
    /// all-or-nothing.
    pub async fn put_calendar_object(
        &self,
        conn: &mut DbConnection<'_>,
        principal: Option<&str>,
        object_path: &str,
        ical: ICalendar,
        preconditions: Preconditions,
    ) -> ServiceResult<(String, PutOutcome)> {
        let folder_id = path::folder_id(object_path)?;
        let outcome = object::put_calendar_object(conn, folder_id, ical, preconditions).await?;

        let home_set = self.calendar_home_set_path(principal)?;
        let stored_path = path::object_path(&home_set, folder_id, outcome.uid, ".ics");
        Ok((stored_path, outcome))
    }

    /// ## Summary
    /// Deletes a calendar object by path.
    ///
    /// ## Errors
    /// Returns `NotFound` when nothing is stored at the path.
    pub async fn delete_calendar_object(
        &self,
        conn: &mut DbConnection<'_>,
        object_path: &str,
    ) -> ServiceResult<()> {
        let uid = path::object_uid(object_path)?;
        object::delete_calendar_object(conn, uid).await
    }

    fn to_object(
        &self,
        principal: Option<&str>,
        loaded: LoadedObject,
    ) -> ServiceResult<CalendarObject> {
        let home_set = self.calendar_home_set_path(principal)?;
        Ok(CalendarObject {
            path: path::object_path(&home_set, loaded.folder_id, loaded.uid, ".ics"),
            uid: loaded.uid,
            etag: loaded.etag,
            modified_at: loaded.modified_at,
            size: loaded.size,
            data: loaded.ical,
            body: loaded.body,
        })
    }
}

/// Component-kind and time-range matching for calendar-query.
fn matches_query(obj: &CalendarObject, kind: Option<ComponentKind>, query: &CalendarQuery) -> bool {
    let components = obj.data.stored_components();

    if let Some(kind) = kind
        && !components.iter().any(|c| c.kind == Some(kind))
    {
        return false;
    }

    if query.start.is_none() && query.end.is_none() {
        return true;
    }

    components.iter().any(|component| {
        let start = component
            .get_property("DTSTART")
            .and_then(|p| p.as_datetime())
            .map(|dt| dt.to_utc(0));
        let end = component
            .get_property("DTEND")
            .and_then(|p| p.as_datetime())
            .map(|dt| dt.to_utc(0))
            .or(start);

        match (start, end) {
            (Some(start), Some(end)) => {
                query.end.is_none_or(|range_end| start < range_end)
                    && query.start.is_none_or(|range_start| end > range_start)
            }
            // Components without a span only match unbounded queries
            _ => false,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn home_set_requires_principal() {
        let backend = CalendarBackend::new("calendars");
        assert!(matches!(
            backend.calendar_home_set_path(None).unwrap_err(),
            ServiceError::NotAuthenticated
        ));
        assert_eq!(
            backend.calendar_home_set_path(Some("alice")).unwrap(),
            "/alice/calendars/"
        );
    }
}
