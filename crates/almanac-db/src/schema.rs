//! Diesel table definitions for the CalDAV/CardDAV schema.
//!
//! The SQL source of truth lives in `migrations/`. Two indexes matter for
//! write semantics:
//! - `event_component` is unique on `(calendar_file_uid, created_at)`
//!   declared NULLS NOT DISTINCT, so components without CREATED still
//!   upsert in place instead of accumulating rows.
//! - `recurrence_exception` is unique on `(recurrence_id, exception_date)`,
//!   which makes the last writer win for conflicting overrides.

diesel::table! {
    calendar_folder (id) {
        id -> Int4,
        name -> Text,
        description -> Nullable<Text>,
        types -> Array<Text>,
        max_size -> Int8,
    }
}

diesel::table! {
    calendar_file (uid) {
        uid -> Uuid,
        folder_id -> Int4,
        etag -> Text,
        modified_at -> Timestamptz,
        size -> Int8,
    }
}

diesel::table! {
    calendar_property (calendar_file_uid) {
        calendar_file_uid -> Uuid,
        version -> Text,
        product -> Text,
        scale -> Nullable<Text>,
        method -> Nullable<Text>,
    }
}

diesel::table! {
    event_component (id) {
        id -> Int4,
        calendar_file_uid -> Uuid,
        component_type -> Bool,
        date_timestamp -> Nullable<Timestamptz>,
        created_at -> Nullable<Timestamptz>,
        last_modified_at -> Nullable<Timestamptz>,
        summary -> Nullable<Text>,
        description -> Nullable<Text>,
        url -> Nullable<Text>,
        organizer -> Nullable<Text>,
        start_date -> Nullable<Timestamptz>,
        end_date -> Nullable<Timestamptz>,
        duration_seconds -> Nullable<Int8>,
        all_day -> Bool,
        class -> Nullable<Text>,
        location -> Nullable<Text>,
        priority -> Nullable<Int4>,
        sequence -> Nullable<Int4>,
        status -> Nullable<Text>,
        categories -> Nullable<Text>,
        transparency -> Nullable<Bool>,
        completed -> Nullable<Timestamptz>,
        percent_complete -> Nullable<Int4>,
    }
}

diesel::table! {
    recurrence (id) {
        id -> Int4,
        event_component_id -> Int4,
        interval -> Nullable<Int4>,
        until -> Nullable<Date>,
        count -> Nullable<Int4>,
        week_start -> Nullable<Int2>,
        by_day -> Nullable<Int4>,
        by_month_day -> Nullable<Int8>,
        by_month -> Nullable<Int4>,
        period_day -> Nullable<Int4>,
        by_set_pos -> Nullable<Array<Int4>>,
        this_and_future -> Bool,
    }
}

diesel::table! {
    recurrence_exception (id) {
        id -> Int4,
        event_component_id -> Int4,
        recurrence_id -> Int4,
        exception_date -> Timestamptz,
        deleted_recurrence -> Bool,
    }
}

diesel::table! {
    custom_property (calendar_file_uid, parent_id, prop_name) {
        calendar_file_uid -> Uuid,
        parent_id -> Int4,
        prop_name -> Text,
        parameter_name -> Text,
        value -> Text,
    }
}

diesel::table! {
    addressbook_folder (id) {
        id -> Int4,
        name -> Text,
        description -> Nullable<Text>,
        types -> Array<Text>,
        max_size -> Int8,
    }
}

diesel::table! {
    card_file (uid) {
        uid -> Uuid,
        folder_id -> Int4,
        file_name -> Text,
        etag -> Text,
        created_at -> Timestamptz,
        modified_at -> Timestamptz,
        size -> Int8,
        version -> Text,
        formatted_name -> Nullable<Text>,
        family_name -> Nullable<Text>,
        given_name -> Nullable<Text>,
        additional_names -> Nullable<Text>,
        honorific_prefix -> Nullable<Text>,
        honorific_suffix -> Nullable<Text>,
        product -> Nullable<Text>,
        kind -> Nullable<Text>,
        nickname -> Nullable<Text>,
        birthday -> Nullable<Date>,
        anniversary -> Nullable<Date>,
        gender -> Nullable<Text>,
        revision_at -> Nullable<Timestamptz>,
        language -> Nullable<Text>,
        timezone -> Nullable<Text>,
        title -> Nullable<Text>,
        role -> Nullable<Text>,
        categories -> Nullable<Text>,
        note -> Nullable<Text>,
        organization -> Nullable<Text>,
    }
}

diesel::joinable!(calendar_file -> calendar_folder (folder_id));
diesel::joinable!(calendar_property -> calendar_file (calendar_file_uid));
diesel::joinable!(event_component -> calendar_file (calendar_file_uid));
diesel::joinable!(recurrence -> event_component (event_component_id));
diesel::joinable!(recurrence_exception -> recurrence (recurrence_id));
diesel::joinable!(card_file -> addressbook_folder (folder_id));

diesel::allow_tables_to_appear_in_same_query!(
    calendar_folder,
    calendar_file,
    calendar_property,
    event_component,
    recurrence,
    recurrence_exception,
    custom_property,
    addressbook_folder,
    card_file,
);
