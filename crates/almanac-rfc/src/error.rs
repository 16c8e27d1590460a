use thiserror::Error;

/// RFC layer errors
#[derive(Error, Debug)]
pub enum RfcError {
    #[error("iCalendar parse error: {0}")]
    IcalParseError(#[from] crate::ical::parse::ParseError),

    #[error("vCard parse error: {0}")]
    VcardParseError(#[from] crate::vcard::parse::VcardParseError),

    #[error("Timezone error: {0}")]
    TzError(#[from] crate::ical::tz::TzError),

    #[error(transparent)]
    CoreError(#[from] almanac_core::error::CoreError),
}

pub type RfcResult<T> = std::result::Result<T, RfcError>;
