//! vCard serializer (RFC 6350).

use super::core::{VCard, VCardProperty};
use crate::ical::build::{escape_param_value, fold_line};

/// ## Summary
/// Serializes a vCard to a string.
///
/// Property order follows insertion order except VERSION, which always
/// comes first per RFC 6350 §6.7.9.
#[must_use]
pub fn serialize(card: &VCard) -> String {
    let mut result = String::new();
    result.push_str("BEGIN:VCARD\r\n");

    if let Some(version) = card.get_property("VERSION") {
        result.push_str(&serialize_property(version));
    }
    for prop in &card.properties {
        if prop.name != "VERSION" {
            result.push_str(&serialize_property(prop));
        }
    }

    result.push_str("END:VCARD\r\n");
    result
}

fn serialize_property(prop: &VCardProperty) -> String {
    let mut line = String::new();

    if let Some(group) = &prop.group {
        line.push_str(group);
        line.push('.');
    }
    line.push_str(&prop.name);

    for param in &prop.params {
        line.push(';');
        line.push_str(&param.name);
        line.push('=');
        let values: Vec<String> = param.values.iter().map(|v| escape_param_value(v)).collect();
        line.push_str(&values.join(","));
    }

    line.push(':');
    line.push_str(&prop.value);

    fold_line(&line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vcard::parse;

    #[test]
    fn serialize_version_first() {
        let mut card = VCard::default();
        card.set_value("FN", "Jane Doe");
        card.set_value("VERSION", "4.0");

        let output = serialize(&card);
        let version_pos = output.find("VERSION:").unwrap();
        let fn_pos = output.find("FN:").unwrap();
        assert!(version_pos < fn_pos);
    }

    #[test]
    fn roundtrip_simple_card() {
        let input = "\
BEGIN:VCARD\r\n\
VERSION:4.0\r\n\
UID:abc\r\n\
FN:Jane Doe\r\n\
EMAIL;TYPE=work:jane@example.com\r\n\
END:VCARD\r\n";

        let card = parse::parse(input).unwrap();
        let output = serialize(&card);
        assert_eq!(output, input);
    }

    #[test]
    fn serialize_preserves_group() {
        let input = "\
BEGIN:VCARD\r\n\
VERSION:3.0\r\n\
FN:X\r\n\
item1.TEL:+1234567\r\n\
END:VCARD\r\n";
        let card = parse::parse(input).unwrap();
        assert!(serialize(&card).contains("item1.TEL:+1234567\r\n"));
    }
}
