//! Calendar object storage and retrieval.
//!
//! The write path validates the parsed calendar, normalizes every stored
//! date-time to UTC (dropping VTIMEZONE children), canonically encodes it
//! for the ETag, and lands all rows in one transaction: file header,
//! calendar property, component rows, the recurrence row, its exception
//! rows, and the X-* properties. Override components attach their
//! exception rows through the per-request [`OnceValue`] handshake that
//! carries the master's recurrence row id.

use chrono::{DateTime, Utc};
use diesel_async::AsyncConnection;
use diesel_async::scoped_futures::ScopedFutureExt;

use almanac_db::db::connection::DbConnection;
use almanac_db::db::etag;
use almanac_db::db::map::assemble::{StoredComponent, assemble};
use almanac_db::db::map::scan::{ScannedComponent, scan_component};
use almanac_db::db::map::recurrence::decode_row;
use almanac_db::db::query::caldav::{component, custom_prop, file, recurrence};
use almanac_db::model::caldav::custom_prop::NewCustomProperty;
use almanac_db::model::caldav::file::{NewCalendarFile, NewCalendarProperty};
use almanac_db::model::caldav::recurrence::NewRecurrenceException;
use almanac_rfc::ical::build::serialize;
use almanac_rfc::ical::core::{Component, ComponentKind, ICalendar, IcalDateTime, Property, Value};
use almanac_rfc::ical::tz::build_timezone_resolver;

use crate::error::{ServiceError, ServiceResult};
use crate::once_value::OnceValue;

use super::precondition::{Preconditions, next_sequence};

/// Result of storing a calendar object.
#[derive(Debug, Clone)]
pub struct PutOutcome {
    pub uid: uuid::Uuid,
    pub etag: String,
    pub modified_at: DateTime<Utc>,
    pub size: i64,
    /// Whether the object was newly created rather than overwritten.
    pub created: bool,
}

/// A calendar object loaded from the store.
#[derive(Debug, Clone)]
pub struct LoadedObject {
    pub uid: uuid::Uuid,
    pub folder_id: i32,
    pub etag: String,
    pub modified_at: DateTime<Utc>,
    pub size: i64,
    pub ical: ICalendar,
    /// Canonical encoding of `ical`.
    pub body: String,
}

/// An exception row waiting for the batch flush. Overrides cannot know
/// their recurrence id until the master's row lands, so they carry a
/// marker resolved through the handshake at flush time.
enum QueuedException {
    Ready(NewRecurrenceException),
    AwaitingParent {
        component_id: i32,
        date: DateTime<Utc>,
    },
}

/// ## Summary
/// Validates and stores a calendar object under one transaction.
///
/// ## Side Effects
/// Mutates `ical`: date-times are normalized to UTC (TZID parameters
/// removed) and VTIMEZONE children dropped before encoding.
///
/// ## Errors
/// - `InvalidCalendarObject` for structural problems (missing
///   VERSION/PRODID, no storable component, mixed kinds, missing or
///   non-UUID UID, overrides without a recurring master).
/// - `PreconditionNoneMatchFailed` / `PreconditionMatchFailed` /
///   `BadRequest` from conditional headers.
/// - Database errors, which roll the transaction back in full.
#[tracing::instrument(skip(conn, ical, preconditions), fields(folder_id))]
pub async fn put_calendar_object(
    conn: &mut DbConnection<'_>,
    folder_id: i32,
    mut ical: ICalendar,
    preconditions: Preconditions,
) -> ServiceResult<PutOutcome> {
    let (uid, _kind) = validate(&ical)?;

    normalize_to_utc(&mut ical)?;

    // Fast-fail on preconditions and pick up the stored sequence; the
    // transaction re-evaluates both authoritatively.
    let existing = file::get(conn, uid).await?;
    preconditions.evaluate(existing.as_ref().map(|f| f.etag.as_str()))?;
    let created = existing.is_none();
    let stored_sequence = component::max_sequence(conn, uid).await?;
    let matched_update = preconditions.is_conditional_update();

    // The sequence lands in the graph before encoding: the ETag covers
    // the resource exactly as it will be stored and re-read.
    apply_sequence_policy(&mut ical, stored_sequence, matched_update);

    let body = serialize(&ical);
    let new_etag = etag::from_data(body.as_bytes());
    let modified_at = Utc::now();
    let size = i64::try_from(body.len()).unwrap_or(i64::MAX);

    tracing::debug!(etag = %new_etag, size, "Canonical encoding ready");

    let version = ical.version().unwrap_or("2.0").to_string();
    let product = ical.prodid().unwrap_or_default().to_string();
    let scale = ical.calscale().map(str::to_string);
    let method = ical.method().map(str::to_string);

    let mut resolver =
        build_timezone_resolver(&ical).map_err(almanac_rfc::error::RfcError::from)?;
    let mut scans: Vec<ScannedComponent> = Vec::new();
    for child in ical.stored_components() {
        scans.push(
            scan_component(child, uid, &mut resolver)
                .map_err(|e| ServiceError::InvalidCalendarObject(e.to_string()))?,
        );
    }

    // Masters first: a recurrence rebuild cascade-deletes the override
    // rows old exception rows point at, and the overrides of this PUT
    // must be written after that, not before.
    scans.sort_by_key(|s| s.recurrence_id.is_some());

    let etag_for_tx = new_etag.clone();

    conn.transaction::<_, ServiceError, _>(move |tx| {
            async move {
                let current = file::get(tx, uid).await?;
                preconditions.evaluate(current.as_ref().map(|f| f.etag.as_str()))?;

                file::upsert(
                    tx,
                    &NewCalendarFile {
                        uid,
                        folder_id,
                        etag: &etag_for_tx,
                        modified_at,
                        size,
                    },
                )
                .await?;

                file::upsert_property(
                    tx,
                    &NewCalendarProperty {
                        calendar_file_uid: uid,
                        version: &version,
                        product: &product,
                        scale: scale.as_deref(),
                        method: method.as_deref(),
                    },
                )
                .await?;

                let recur_parent: OnceValue<i32> = OnceValue::new();
                let mut queued_exceptions: Vec<QueuedException> = Vec::new();
                let mut queued_props: Vec<NewCustomProperty> = Vec::new();
                let single_plain_component = scans.len() == 1;

                for scanned in scans {
                    let component_id = component::upsert(tx, &scanned.row).await?;

                    if let Some(date) = scanned.recurrence_id {
                        queued_exceptions.push(QueuedException::AwaitingParent {
                            component_id,
                            date,
                        });
                    } else if let Some((encoding, rule_string)) = scanned.rule {
                        write_recurrence(
                            tx,
                            component_id,
                            encoding,
                            &rule_string,
                            &scanned.exdates,
                            &recur_parent,
                            &mut queued_exceptions,
                        )
                        .await?;
                    } else if single_plain_component {
                        // The client downgraded a recurring object to a
                        // single one; any stored series goes with it.
                        let removed = recurrence::remove_for_component(tx, component_id).await?;
                        if !removed.is_empty() {
                            tracing::debug!(
                                component_id,
                                overrides = removed.len(),
                                "Dropped stored recurrence with its overrides"
                            );
                        }
                    }

                    for prop in scanned.custom_props {
                        queued_props.push(NewCustomProperty {
                            calendar_file_uid: uid,
                            parent_id: component_id,
                            prop_name: prop.name,
                            parameter_name: prop.value_type,
                            value: prop.value,
                        });
                    }
                }

                // Batch flush: every component row exists by now, so the
                // handshake resolves without waiting.
                for queued in queued_exceptions {
                    let row = match queued {
                        QueuedException::Ready(row) => row,
                        QueuedException::AwaitingParent { component_id, date } => {
                            let recurrence_id = recur_parent.get().await;
                            NewRecurrenceException {
                                event_component_id: component_id,
                                recurrence_id,
                                exception_date: date,
                                deleted_recurrence: false,
                            }
                        }
                    };
                    recurrence::upsert_exception(tx, &row).await?;
                }

                for prop in queued_props {
                    custom_prop::upsert(tx, &prop).await?;
                }

                Ok(())
            }
            .scope_boxed()
        })
        .await?;

    tracing::info!(uid = %uid, etag = %new_etag, created, "Calendar object stored");

    Ok(PutOutcome {
        uid,
        etag: new_etag,
        modified_at,
        size,
        created,
    })
}

/// Writes the master's recurrence row, rebuilding the exception set when
/// the serialized rule changed, and publishes the row id for override
/// siblings.
async fn write_recurrence(
    tx: &mut DbConnection<'_>,
    component_id: i32,
    encoding: almanac_db::db::map::recurrence::EncodedRecurrence,
    rule_string: &str,
    exdates: &[DateTime<Utc>],
    recur_parent: &OnceValue<i32>,
    queued: &mut Vec<QueuedException>,
) -> ServiceResult<()> {
    if let Some(stored) = recurrence::get_by_component(tx, component_id).await? {
        let stored_rule = decode_row(&stored).map(|r| r.to_string());
        if stored_rule.as_deref() != Some(rule_string) {
            tracing::debug!(component_id, "Recurrence rule changed, rebuilding exceptions");
            recurrence::remove_for_component(tx, component_id).await?;
        }
    }

    let recurrence_id = recurrence::upsert(tx, &encoding.into_row(component_id)).await?;
    recur_parent.set(recurrence_id);

    for date in exdates {
        queued.push(QueuedException::Ready(NewRecurrenceException {
            event_component_id: component_id,
            recurrence_id,
            exception_date: *date,
            deleted_recurrence: true,
        }));
    }

    Ok(())
}

/// ## Summary
/// Loads a calendar object and reassembles its iCalendar graph.
///
/// The canonical body is re-encoded on the way out; its length replaces
/// the stored size when the two drifted.
///
/// ## Errors
/// Returns `NotFound` when the file or its property row is missing;
/// database errors otherwise.
#[tracing::instrument(skip(conn))]
pub async fn get_calendar_object(
    conn: &mut DbConnection<'_>,
    uid: uuid::Uuid,
) -> ServiceResult<LoadedObject> {
    let header = file::get(conn, uid)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("calendar object {uid}")))?;

    let property = file::get_property(conn, uid)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("calendar properties for {uid}")))?;

    let rows = component::list_by_file(conn, uid).await?;

    let mut components: Vec<StoredComponent> = Vec::with_capacity(rows.len());
    let mut override_dates: std::collections::HashMap<i32, DateTime<Utc>> =
        std::collections::HashMap::new();

    for row in rows {
        let recurrence_row = recurrence::get_by_component(conn, row.id).await?;

        let mut exdates = Vec::new();
        if let Some(recurrence_row) = &recurrence_row {
            for exception in recurrence::list_exceptions(conn, recurrence_row.id).await? {
                if exception.deleted_recurrence {
                    exdates.push(exception.exception_date);
                } else {
                    override_dates
                        .insert(exception.event_component_id, exception.exception_date);
                }
            }
        }

        let custom_props = custom_prop::list_for_component(conn, uid, row.id).await?;

        components.push(StoredComponent {
            row,
            recurrence: recurrence_row,
            exdates,
            recurrence_id: None,
            custom_props,
        });
    }

    for stored in &mut components {
        stored.recurrence_id = override_dates.get(&stored.row.id).copied();
    }

    let ical = assemble(&uid.to_string(), &property, &components);
    let body = serialize(&ical);
    let size = i64::try_from(body.len()).unwrap_or(header.size);

    Ok(LoadedObject {
        uid,
        folder_id: header.folder_id,
        etag: header.etag,
        modified_at: header.modified_at,
        size,
        ical,
        body,
    })
}

/// ## Summary
/// Deletes a calendar object; every dependent row cascades.
///
/// ## Errors
/// Returns `NotFound` when no row exists for the uid.
#[tracing::instrument(skip(conn))]
pub async fn delete_calendar_object(
    conn: &mut DbConnection<'_>,
    uid: uuid::Uuid,
) -> ServiceResult<()> {
    let deleted = file::delete(conn, uid).await?;
    if deleted == 0 {
        return Err(ServiceError::NotFound(format!("calendar object {uid}")));
    }
    Ok(())
}

/// ## Summary
/// Structural validation of an incoming calendar object.
///
/// Returns the shared UID and the component kind.
///
/// ## Errors
/// Returns `InvalidCalendarObject` (the `valid-calendar-object-resource`
/// precondition) when the object breaks any structural rule.
pub fn validate(ical: &ICalendar) -> ServiceResult<(uuid::Uuid, ComponentKind)> {
    if ical.version().is_none() {
        return Err(ServiceError::InvalidCalendarObject(
            "missing VERSION property".to_string(),
        ));
    }
    if ical.prodid().is_none() {
        return Err(ServiceError::InvalidCalendarObject(
            "missing PRODID property".to_string(),
        ));
    }

    let components = ical.stored_components();
    if components.is_empty() {
        return Err(ServiceError::InvalidCalendarObject(
            "no VEVENT or VTODO component".to_string(),
        ));
    }

    let kind = components[0].kind.unwrap_or(ComponentKind::Unknown);
    if components.iter().any(|c| c.kind != Some(kind)) {
        return Err(ServiceError::InvalidCalendarObject(
            "mixed component kinds in one object".to_string(),
        ));
    }

    let uid = ical.uid().ok_or_else(|| {
        ServiceError::InvalidCalendarObject("missing or conflicting UID".to_string())
    })?;
    let uid = uuid::Uuid::parse_str(uid).map_err(|_| {
        ServiceError::InvalidCalendarObject(format!("UID is not a UUID: {uid}"))
    })?;

    let masters: Vec<&&Component> = components.iter().filter(|c| !c.is_override()).collect();
    if masters.len() > 1 {
        return Err(ServiceError::InvalidCalendarObject(
            "more than one master component".to_string(),
        ));
    }

    let has_override = components.iter().any(|c| c.is_override());
    if has_override {
        let master_has_rule = masters
            .first()
            .is_some_and(|m| m.get_property("RRULE").is_some());
        if !master_has_rule {
            return Err(ServiceError::InvalidCalendarObject(
                "override component without a recurring master".to_string(),
            ));
        }
    }

    Ok((uid, kind))
}

/// ## Summary
/// Applies the conditional-write sequence policy to every stored
/// component: a matched `If-Match` update bumps once past both the
/// stored and the supplied value, an unconditional write preserves the
/// supplied value or defaults it to 1.
///
/// Runs before canonical encoding so the SEQUENCE in the stored bytes,
/// the component rows, and later reads all agree.
pub fn apply_sequence_policy(ical: &mut ICalendar, stored: Option<i32>, matched_update: bool) {
    for child in &mut ical.root.children {
        if !child.kind.is_some_and(ComponentKind::is_stored) {
            continue;
        }
        let supplied = child.get_property("SEQUENCE").and_then(Property::as_integer);
        let sequence = next_sequence(stored, supplied, matched_update);
        child.remove_properties("SEQUENCE");
        child.add_property(Property::integer("SEQUENCE", sequence));
    }
}

/// ## Summary
/// Normalizes every date-time of the stored components to UTC and drops
/// VTIMEZONE children. TZID parameters are removed alongside. Multiple
/// EXDATE properties merge into one sorted list, the form the reader
/// re-emits.
///
/// ## Errors
/// Returns an error when a TZID resolves nowhere.
pub fn normalize_to_utc(ical: &mut ICalendar) -> ServiceResult<()> {
    let mut resolver =
        build_timezone_resolver(ical).map_err(almanac_rfc::error::RfcError::from)?;

    for child in &mut ical.root.children {
        if !child.kind.is_some_and(ComponentKind::is_stored) {
            continue;
        }
        for prop in &mut child.properties {
            match &prop.value {
                Value::DateTime(dt) => {
                    if !dt.is_utc() {
                        let utc = IcalDateTime::from_utc(
                            resolver.to_utc(dt).map_err(almanac_rfc::error::RfcError::from)?,
                        );
                        prop.raw_value = utc.to_string();
                        prop.value = Value::DateTime(utc);
                        prop.remove_param("TZID");
                    }
                }
                Value::DateTimeList(list) => {
                    if list.iter().any(|dt| !dt.is_utc()) {
                        let mut converted = Vec::with_capacity(list.len());
                        for dt in list {
                            let utc = resolver
                                .to_utc(dt)
                                .map_err(almanac_rfc::error::RfcError::from)?;
                            converted.push(IcalDateTime::from_utc(utc));
                        }
                        prop.raw_value = converted
                            .iter()
                            .map(ToString::to_string)
                            .collect::<Vec<_>>()
                            .join(",");
                        prop.value = Value::DateTimeList(converted);
                        prop.remove_param("TZID");
                    }
                }
                _ => {}
            }
        }

        merge_exdates(child);
    }

    ical.root
        .children
        .retain(|c| c.kind != Some(ComponentKind::Timezone));

    Ok(())
}

/// Collapses every EXDATE property of a component into a single sorted,
/// deduplicated list.
fn merge_exdates(component: &mut Component) {
    let mut dates: Vec<IcalDateTime> = Vec::new();
    let mut seen = 0usize;

    for prop in component.get_properties("EXDATE") {
        seen += 1;
        if let Value::DateTimeList(list) = &prop.value {
            dates.extend(list.iter().cloned());
        }
    }

    // Date-only EXDATEs (VALUE=DATE) stay as written
    if seen == 0 || dates.is_empty() {
        return;
    }

    dates.sort_by_key(IcalDateTime::naive);
    dates.dedup();

    let raw = dates
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");

    component.remove_properties("EXDATE");
    component.add_property(Property::with_value(
        "EXDATE",
        Value::DateTimeList(dates),
        raw,
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use almanac_rfc::ical::parse::parse;

    fn calendar(body: &str) -> ICalendar {
        let input = format!(
            "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//T//T//EN\r\n{body}END:VCALENDAR\r\n"
        );
        parse(&input).unwrap()
    }

    const UID: &str = "4fbe8971-0bc3-424c-9c26-36c3e1eff6b1";

    #[test]
    fn validate_accepts_simple_event() {
        let ical = calendar(&format!("BEGIN:VEVENT\r\nUID:{UID}\r\nEND:VEVENT\r\n"));
        let (uid, kind) = validate(&ical).unwrap();
        assert_eq!(uid.to_string(), UID);
        assert_eq!(kind, ComponentKind::Event);
    }

    #[test]
    fn validate_rejects_missing_version() {
        let input = format!(
            "BEGIN:VCALENDAR\r\nPRODID:-//T//T//EN\r\nBEGIN:VEVENT\r\nUID:{UID}\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n"
        );
        let ical = parse(&input).unwrap();
        assert!(matches!(
            validate(&ical).unwrap_err(),
            ServiceError::InvalidCalendarObject(_)
        ));
    }

    #[test]
    fn validate_rejects_missing_components() {
        let input = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//T//T//EN\r\nEND:VCALENDAR\r\n";
        let ical = parse(input).unwrap();
        assert!(validate(&ical).is_err());
    }

    #[test]
    fn validate_rejects_non_uuid_uid() {
        let ical = calendar("BEGIN:VEVENT\r\nUID:plain-string\r\nEND:VEVENT\r\n");
        assert!(validate(&ical).is_err());
    }

    #[test]
    fn validate_rejects_mixed_kinds() {
        let ical = calendar(&format!(
            "BEGIN:VEVENT\r\nUID:{UID}\r\nEND:VEVENT\r\nBEGIN:VTODO\r\nUID:{UID}\r\nEND:VTODO\r\n"
        ));
        assert!(validate(&ical).is_err());
    }

    #[test]
    fn validate_rejects_two_masters() {
        let ical = calendar(&format!(
            "BEGIN:VEVENT\r\nUID:{UID}\r\nEND:VEVENT\r\nBEGIN:VEVENT\r\nUID:{UID}\r\nEND:VEVENT\r\n"
        ));
        assert!(validate(&ical).is_err());
    }

    #[test]
    fn validate_rejects_override_without_recurring_master() {
        let ical = calendar(&format!(
            "BEGIN:VEVENT\r\nUID:{UID}\r\nEND:VEVENT\r\n\
             BEGIN:VEVENT\r\nUID:{UID}\r\nRECURRENCE-ID:20240116T090000Z\r\nEND:VEVENT\r\n"
        ));
        assert!(validate(&ical).is_err());
    }

    #[test]
    fn validate_accepts_master_with_override() {
        let ical = calendar(&format!(
            "BEGIN:VEVENT\r\nUID:{UID}\r\nRRULE:FREQ=DAILY;COUNT=5\r\nEND:VEVENT\r\n\
             BEGIN:VEVENT\r\nUID:{UID}\r\nRECURRENCE-ID:20240116T090000Z\r\nEND:VEVENT\r\n"
        ));
        assert!(validate(&ical).is_ok());
    }

    #[test]
    fn normalize_converts_zoned_times_and_drops_vtimezone() {
        let mut ical = calendar(&format!(
            "BEGIN:VTIMEZONE\r\nTZID:Europe/Moscow\r\n\
             BEGIN:STANDARD\r\nDTSTART:19700101T000000\r\nTZOFFSETTO:+0300\r\nTZOFFSETFROM:+0300\r\nEND:STANDARD\r\n\
             END:VTIMEZONE\r\n\
             BEGIN:VEVENT\r\nUID:{UID}\r\nDTSTART;TZID=Europe/Moscow:20240115T120000\r\nEND:VEVENT\r\n"
        ));

        normalize_to_utc(&mut ical).unwrap();

        assert!(ical.timezones().is_empty());
        let event = ical.events()[0];
        let dtstart = event.get_property("DTSTART").unwrap();
        assert_eq!(dtstart.raw_value, "20240115T090000Z");
        assert!(dtstart.get_param("TZID").is_none());
    }

    #[test]
    fn normalize_leaves_utc_values_alone() {
        let mut ical = calendar(&format!(
            "BEGIN:VEVENT\r\nUID:{UID}\r\nDTSTART:20240115T090000Z\r\nEND:VEVENT\r\n"
        ));
        let before = serialize(&ical);
        normalize_to_utc(&mut ical).unwrap();
        assert_eq!(serialize(&ical), before);
    }

    #[test]
    fn sequence_policy_rewrites_the_graph() {
        let mut ical = calendar(&format!("BEGIN:VEVENT\r\nUID:{UID}\r\nEND:VEVENT\r\n"));
        apply_sequence_policy(&mut ical, None, false);
        assert_eq!(
            ical.events()[0].get_property("SEQUENCE").unwrap().as_integer(),
            Some(1)
        );

        let mut ical = calendar(&format!(
            "BEGIN:VEVENT\r\nUID:{UID}\r\nSEQUENCE:1\r\nEND:VEVENT\r\n"
        ));
        apply_sequence_policy(&mut ical, Some(1), true);
        assert_eq!(
            ical.events()[0].get_property("SEQUENCE").unwrap().as_integer(),
            Some(2)
        );
    }

    #[test]
    fn normalize_merges_multiple_exdate_properties() {
        let mut ical = calendar(&format!(
            "BEGIN:VEVENT\r\nUID:{UID}\r\n\
             RRULE:FREQ=DAILY;COUNT=9\r\n\
             EXDATE:20240117T090000Z\r\n\
             EXDATE:20240116T090000Z\r\n\
             END:VEVENT\r\n"
        ));

        normalize_to_utc(&mut ical).unwrap();

        let exdates = ical.events()[0].get_properties("EXDATE");
        assert_eq!(exdates.len(), 1);
        assert_eq!(exdates[0].raw_value, "20240116T090000Z,20240117T090000Z");
    }

    #[test]
    fn normalize_converts_exdate_lists() {
        let mut ical = calendar(&format!(
            "BEGIN:VEVENT\r\nUID:{UID}\r\n\
             RRULE:FREQ=DAILY;COUNT=5\r\n\
             EXDATE;TZID=Europe/Moscow:20240116T120000,20240117T120000\r\n\
             END:VEVENT\r\n"
        ));

        normalize_to_utc(&mut ical).unwrap();

        let exdate = ical.events()[0].get_property("EXDATE").unwrap();
        assert_eq!(exdate.raw_value, "20240116T090000Z,20240117T090000Z");
    }
}
