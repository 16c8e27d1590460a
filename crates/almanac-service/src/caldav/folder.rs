//! Calendar collection management.

use almanac_core::constants::{DEFAULT_COMPONENT_SET, DEFAULT_MAX_RESOURCE_SIZE};
use almanac_db::db::connection::DbConnection;
use almanac_db::db::query::caldav::folder;
use almanac_db::model::caldav::folder::NewCalendarFolder;

use crate::error::{ServiceError, ServiceResult};

/// A calendar collection as the DAV layer sees it. The surrogate id is
/// the collection's path component under the home set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarDescriptor {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub supported_components: Vec<String>,
    pub max_resource_size: i64,
}

/// What MKCALENDAR asked for. Missing pieces get server defaults.
#[derive(Debug, Clone, Default)]
pub struct CreateCalendarRequest {
    pub name: String,
    pub description: Option<String>,
    pub supported_components: Vec<String>,
    pub max_resource_size: Option<i64>,
}

/// ## Summary
/// Creates a calendar collection and returns its descriptor.
///
/// A request without a component set or size gets the default
/// `{VEVENT, VTODO, VJOURNAL}` set and max resource size, matching what
/// clients expect from a bare MKCALENDAR.
///
/// ## Errors
/// Returns an error if the insert fails.
#[tracing::instrument(skip(conn, request), fields(name = %request.name))]
pub async fn create_calendar(
    conn: &mut DbConnection<'_>,
    request: CreateCalendarRequest,
) -> ServiceResult<CalendarDescriptor> {
    let supported_components = if request.supported_components.is_empty() {
        DEFAULT_COMPONENT_SET.map(str::to_string).to_vec()
    } else {
        request.supported_components
    };
    let max_resource_size = request
        .max_resource_size
        .unwrap_or(DEFAULT_MAX_RESOURCE_SIZE);

    let id = folder::create(
        conn,
        &NewCalendarFolder {
            name: &request.name,
            description: request.description.as_deref(),
            types: supported_components.clone(),
            max_size: max_resource_size,
        },
    )
    .await?;

    tracing::info!(id, "Calendar collection created");

    Ok(CalendarDescriptor {
        id,
        name: request.name,
        description: request.description,
        supported_components,
        max_resource_size,
    })
}

/// ## Summary
/// Lists all calendar collections.
///
/// ## Errors
/// Returns an error if the query fails.
pub async fn list_calendars(conn: &mut DbConnection<'_>) -> ServiceResult<Vec<CalendarDescriptor>> {
    let folders = folder::list(conn).await?;
    Ok(folders
        .into_iter()
        .map(|f| CalendarDescriptor {
            id: f.id,
            name: f.name,
            description: f.description,
            supported_components: f.types,
            max_resource_size: f.max_size,
        })
        .collect())
}

/// ## Summary
/// Loads one calendar collection.
///
/// ## Errors
/// Returns `NotFound` when no folder has this id.
pub async fn get_calendar(
    conn: &mut DbConnection<'_>,
    id: i32,
) -> ServiceResult<CalendarDescriptor> {
    let folder = folder::get(conn, id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("calendar {id}")))?;

    Ok(CalendarDescriptor {
        id: folder.id,
        name: folder.name,
        description: folder.description,
        supported_components: folder.types,
        max_resource_size: folder.max_size,
    })
}

/// ## Summary
/// Deletes a calendar collection; every contained object cascades.
///
/// ## Errors
/// Returns `NotFound` when no folder has this id.
#[tracing::instrument(skip(conn))]
pub async fn delete_calendar(conn: &mut DbConnection<'_>, id: i32) -> ServiceResult<()> {
    let deleted = folder::delete(conn, id).await?;
    if deleted == 0 {
        return Err(ServiceError::NotFound(format!("calendar {id}")));
    }
    Ok(())
}
