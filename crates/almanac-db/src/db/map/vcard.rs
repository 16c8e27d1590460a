//! Scalar vCard ↔ card-row codec.
//!
//! The address-book path has no recurrence machinery; every persisted
//! field is a scalar column on `card_file`.

use chrono::NaiveDate;

use almanac_rfc::vcard::core::{VCard, VCardProperty};

use crate::model::carddav::card::{CardFile, NewCardFile};

/// ## Summary
/// Flattens a vCard into a card row.
///
/// `N` splits into its five structured parts; `BDAY`/`ANNIVERSARY` accept
/// both `YYYYMMDD` and `YYYY-MM-DD`; everything else copies verbatim.
#[must_use]
pub fn scan_card(
    card: &VCard,
    uid: uuid::Uuid,
    folder_id: i32,
    file_name: &str,
    etag: &str,
    size: i64,
    now: chrono::DateTime<chrono::Utc>,
) -> NewCardFile {
    let name_parts = card.name_parts();
    let part = |i: usize| {
        name_parts
            .as_ref()
            .map(|p| p[i].clone())
            .filter(|s| !s.is_empty())
    };

    NewCardFile {
        uid,
        folder_id,
        file_name: file_name.to_string(),
        etag: etag.to_string(),
        created_at: now,
        modified_at: now,
        size,
        version: card.version().unwrap_or("4.0").to_string(),
        formatted_name: value(card, "FN"),
        family_name: part(0),
        given_name: part(1),
        additional_names: part(2),
        honorific_prefix: part(3),
        honorific_suffix: part(4),
        product: value(card, "PRODID"),
        kind: value(card, "KIND"),
        nickname: value(card, "NICKNAME"),
        birthday: date_value(card, "BDAY"),
        anniversary: date_value(card, "ANNIVERSARY"),
        gender: value(card, "GENDER"),
        revision_at: card
            .get_value("REV")
            .and_then(|v| almanac_rfc::ical::core::IcalDateTime::parse(v, None))
            .map(|dt| dt.to_utc(0)),
        language: value(card, "LANG"),
        timezone: value(card, "TZ"),
        title: value(card, "TITLE"),
        role: value(card, "ROLE"),
        categories: value(card, "CATEGORIES"),
        note: value(card, "NOTE"),
        organization: value(card, "ORG"),
    }
}

/// ## Summary
/// Rebuilds a vCard from a card row.
#[must_use]
pub fn assemble_card(row: &CardFile) -> VCard {
    let mut card = VCard::new(&row.version);

    card.add_property(VCardProperty::new("UID", row.uid.to_string()));
    if let Some(fn_) = &row.formatted_name {
        card.set_value("FN", fn_.clone());
    }

    let has_name = [
        &row.family_name,
        &row.given_name,
        &row.additional_names,
        &row.honorific_prefix,
        &row.honorific_suffix,
    ]
    .iter()
    .any(|p| p.is_some());
    if has_name {
        let join = |p: &Option<String>| p.clone().unwrap_or_default();
        card.set_value(
            "N",
            format!(
                "{};{};{};{};{}",
                join(&row.family_name),
                join(&row.given_name),
                join(&row.additional_names),
                join(&row.honorific_prefix),
                join(&row.honorific_suffix),
            ),
        );
    }

    set_opt(&mut card, "PRODID", &row.product);
    set_opt(&mut card, "KIND", &row.kind);
    set_opt(&mut card, "NICKNAME", &row.nickname);
    if let Some(birthday) = row.birthday {
        card.set_value("BDAY", birthday.format("%Y%m%d").to_string());
    }
    if let Some(anniversary) = row.anniversary {
        card.set_value("ANNIVERSARY", anniversary.format("%Y%m%d").to_string());
    }
    set_opt(&mut card, "GENDER", &row.gender);
    if let Some(rev) = row.revision_at {
        card.set_value("REV", rev.format("%Y%m%dT%H%M%SZ").to_string());
    }
    set_opt(&mut card, "LANG", &row.language);
    set_opt(&mut card, "TZ", &row.timezone);
    set_opt(&mut card, "TITLE", &row.title);
    set_opt(&mut card, "ROLE", &row.role);
    set_opt(&mut card, "CATEGORIES", &row.categories);
    set_opt(&mut card, "NOTE", &row.note);
    set_opt(&mut card, "ORG", &row.organization);

    card
}

fn value(card: &VCard, name: &str) -> Option<String> {
    card.get_value(name).map(str::to_string)
}

fn date_value(card: &VCard, name: &str) -> Option<NaiveDate> {
    let raw = card.get_value(name)?;
    NaiveDate::parse_from_str(raw, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}

fn set_opt(card: &mut VCard, name: &str, field: &Option<String>) {
    if let Some(value) = field {
        card.set_value(name, value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use almanac_rfc::vcard::parse::parse;
    use chrono::{TimeZone, Utc};

    const CARD: &str = "\
BEGIN:VCARD\r\n\
VERSION:4.0\r\n\
UID:5f0c4f64-21a2-4e38-8ecb-7a80c02b1f8f\r\n\
FN:Jane Doe\r\n\
N:Doe;Jane;;;\r\n\
BDAY:19900312\r\n\
TITLE:Engineer\r\n\
END:VCARD\r\n";

    #[test]
    fn scan_flattens_scalars() {
        let card = parse(CARD).unwrap();
        let uid = uuid::Uuid::new_v4();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let row = scan_card(&card, uid, 1, "jane.vcf", "etag", 100, now);

        assert_eq!(row.formatted_name.as_deref(), Some("Jane Doe"));
        assert_eq!(row.family_name.as_deref(), Some("Doe"));
        assert_eq!(row.given_name.as_deref(), Some("Jane"));
        assert_eq!(row.additional_names, None);
        assert_eq!(row.birthday, NaiveDate::from_ymd_opt(1990, 3, 12));
        assert_eq!(row.title.as_deref(), Some("Engineer"));
    }

    #[test]
    fn scan_accepts_dashed_dates() {
        let input = CARD.replace("BDAY:19900312", "BDAY:1990-03-12");
        let card = parse(&input).unwrap();
        let row = scan_card(&card, uuid::Uuid::nil(), 1, "f", "e", 0, Utc::now());
        assert_eq!(row.birthday, NaiveDate::from_ymd_opt(1990, 3, 12));
    }

    #[test]
    fn assemble_rebuilds_name() {
        let card = parse(CARD).unwrap();
        let uid = uuid::Uuid::new_v4();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let new = scan_card(&card, uid, 1, "jane.vcf", "etag", 100, now);

        let row = CardFile {
            uid,
            folder_id: new.folder_id,
            file_name: new.file_name,
            etag: new.etag,
            created_at: new.created_at,
            modified_at: new.modified_at,
            size: new.size,
            version: new.version,
            formatted_name: new.formatted_name,
            family_name: new.family_name,
            given_name: new.given_name,
            additional_names: new.additional_names,
            honorific_prefix: new.honorific_prefix,
            honorific_suffix: new.honorific_suffix,
            product: new.product,
            kind: new.kind,
            nickname: new.nickname,
            birthday: new.birthday,
            anniversary: new.anniversary,
            gender: new.gender,
            revision_at: new.revision_at,
            language: new.language,
            timezone: new.timezone,
            title: new.title,
            role: new.role,
            categories: new.categories,
            note: new.note,
            organization: new.organization,
        };

        let rebuilt = assemble_card(&row);
        assert_eq!(rebuilt.uid(), Some(uid.to_string().as_str()));
        assert_eq!(rebuilt.get_value("N"), Some("Doe;Jane;;;"));
        assert_eq!(rebuilt.get_value("BDAY"), Some("19900312"));
    }
}
