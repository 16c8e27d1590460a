//! iCalendar component types (RFC 5545 §3.4-3.6).

use super::Property;

/// Component kind for iCalendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// VCALENDAR wrapper component.
    Calendar,
    /// VEVENT component.
    Event,
    /// VTODO component.
    Todo,
    /// VJOURNAL component.
    Journal,
    /// VTIMEZONE component.
    Timezone,
    /// VALARM component (nested within VEVENT/VTODO).
    Alarm,
    /// STANDARD sub-component of VTIMEZONE.
    Standard,
    /// DAYLIGHT sub-component of VTIMEZONE.
    Daylight,
    /// Unknown/X-component.
    Unknown,
}

impl ComponentKind {
    /// Returns the string name for this component kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Calendar => "VCALENDAR",
            Self::Event => "VEVENT",
            Self::Todo => "VTODO",
            Self::Journal => "VJOURNAL",
            Self::Timezone => "VTIMEZONE",
            Self::Alarm => "VALARM",
            Self::Standard => "STANDARD",
            Self::Daylight => "DAYLIGHT",
            Self::Unknown => "X-UNKNOWN",
        }
    }

    /// Parses a component kind from a string (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "VCALENDAR" => Self::Calendar,
            "VEVENT" => Self::Event,
            "VTODO" => Self::Todo,
            "VJOURNAL" => Self::Journal,
            "VTIMEZONE" => Self::Timezone,
            "VALARM" => Self::Alarm,
            "STANDARD" => Self::Standard,
            "DAYLIGHT" => Self::Daylight,
            _ => Self::Unknown,
        }
    }

    /// Returns whether components of this kind are stored as event rows.
    #[must_use]
    pub const fn is_stored(self) -> bool {
        matches!(self, Self::Event | Self::Todo)
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An iCalendar component: properties plus nested sub-components.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Component {
    /// Component type/name.
    pub kind: Option<ComponentKind>,
    /// Original component name (preserved for X-components).
    pub name: String,
    /// Properties in order of appearance.
    pub properties: Vec<Property>,
    /// Nested sub-components.
    pub children: Vec<Component>,
}

impl Component {
    /// Creates a new component with the given kind.
    #[must_use]
    pub fn new(kind: ComponentKind) -> Self {
        Self {
            kind: Some(kind),
            name: kind.as_str().to_string(),
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Creates a new component with a custom name (for X-components).
    #[must_use]
    pub fn custom(name: impl Into<String>) -> Self {
        let name = name.into();
        let kind = ComponentKind::parse(&name);
        Self {
            kind: Some(kind),
            name,
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Creates a VCALENDAR component.
    #[must_use]
    pub fn calendar() -> Self {
        Self::new(ComponentKind::Calendar)
    }

    /// Creates a VEVENT component.
    #[must_use]
    pub fn event() -> Self {
        Self::new(ComponentKind::Event)
    }

    /// Creates a VTODO component.
    #[must_use]
    pub fn todo() -> Self {
        Self::new(ComponentKind::Todo)
    }

    /// Adds a property to this component.
    pub fn add_property(&mut self, prop: Property) {
        self.properties.push(prop);
    }

    /// Adds a child component.
    pub fn add_child(&mut self, child: Component) {
        self.children.push(child);
    }

    /// Returns the first property with the given name.
    #[must_use]
    pub fn get_property(&self, name: &str) -> Option<&Property> {
        let upper = name.to_ascii_uppercase();
        self.properties.iter().find(|p| p.name == upper)
    }

    /// Returns all properties with the given name.
    #[must_use]
    pub fn get_properties(&self, name: &str) -> Vec<&Property> {
        let upper = name.to_ascii_uppercase();
        self.properties.iter().filter(|p| p.name == upper).collect()
    }

    /// Removes every property with the given name.
    pub fn remove_properties(&mut self, name: &str) {
        let upper = name.to_ascii_uppercase();
        self.properties.retain(|p| p.name != upper);
    }

    /// Returns the UID property value if present.
    #[must_use]
    pub fn uid(&self) -> Option<&str> {
        self.get_property("UID")?.as_text()
    }

    /// Returns whether this component carries a RECURRENCE-ID (i.e. it is
    /// an override of one occurrence of its series).
    #[must_use]
    pub fn is_override(&self) -> bool {
        self.get_property("RECURRENCE-ID").is_some()
    }

    /// Returns children of a specific kind.
    #[must_use]
    pub fn children_of_kind(&self, kind: ComponentKind) -> Vec<&Component> {
        self.children
            .iter()
            .filter(|c| c.kind == Some(kind))
            .collect()
    }
}

/// Top-level iCalendar object: a VCALENDAR component with helpers.
#[derive(Debug, Clone, PartialEq)]
pub struct ICalendar {
    /// The root VCALENDAR component.
    pub root: Component,
}

impl ICalendar {
    /// Creates a new empty iCalendar with required properties.
    #[must_use]
    pub fn new(prodid: impl Into<String>) -> Self {
        let mut root = Component::calendar();
        root.add_property(Property::text("VERSION", "2.0"));
        root.add_property(Property::text("PRODID", prodid));
        Self { root }
    }

    /// Returns the PRODID value.
    #[must_use]
    pub fn prodid(&self) -> Option<&str> {
        self.root.get_property("PRODID")?.as_text()
    }

    /// Returns the VERSION value.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.root.get_property("VERSION")?.as_text()
    }

    /// Returns the CALSCALE value if present.
    #[must_use]
    pub fn calscale(&self) -> Option<&str> {
        self.root.get_property("CALSCALE")?.as_text()
    }

    /// Returns the METHOD value if present.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        self.root.get_property("METHOD")?.as_text()
    }

    /// Returns all VEVENT components.
    #[must_use]
    pub fn events(&self) -> Vec<&Component> {
        self.root.children_of_kind(ComponentKind::Event)
    }

    /// Returns all VTODO components.
    #[must_use]
    pub fn todos(&self) -> Vec<&Component> {
        self.root.children_of_kind(ComponentKind::Todo)
    }

    /// Returns all VTIMEZONE components.
    #[must_use]
    pub fn timezones(&self) -> Vec<&Component> {
        self.root.children_of_kind(ComponentKind::Timezone)
    }

    /// Returns the children that are stored as event rows (VEVENT/VTODO).
    #[must_use]
    pub fn stored_components(&self) -> Vec<&Component> {
        self.root
            .children
            .iter()
            .filter(|c| c.kind.is_some_and(ComponentKind::is_stored))
            .collect()
    }

    /// Returns the UID shared by the stored components, if they agree.
    #[must_use]
    pub fn uid(&self) -> Option<&str> {
        let mut uids = self
            .stored_components()
            .into_iter()
            .filter_map(Component::uid);
        let first = uids.next()?;
        if uids.all(|u| u == first) {
            Some(first)
        } else {
            None
        }
    }
}

impl Default for ICalendar {
    fn default() -> Self {
        Self::new(almanac_core::constants::SERVER_PRODID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_kind_parse() {
        assert_eq!(ComponentKind::parse("VEVENT"), ComponentKind::Event);
        assert_eq!(ComponentKind::parse("vtodo"), ComponentKind::Todo);
        assert_eq!(ComponentKind::parse("X-CUSTOM"), ComponentKind::Unknown);
    }

    #[test]
    fn stored_kinds() {
        assert!(ComponentKind::Event.is_stored());
        assert!(ComponentKind::Todo.is_stored());
        assert!(!ComponentKind::Journal.is_stored());
        assert!(!ComponentKind::Timezone.is_stored());
    }

    #[test]
    fn shared_uid_resolution() {
        let mut ical = ICalendar::default();

        let mut master = Component::event();
        master.add_property(Property::text("UID", "abc"));
        ical.root.add_child(master);

        let mut override_comp = Component::event();
        override_comp.add_property(Property::text("UID", "abc"));
        override_comp.add_property(Property::text("RECURRENCE-ID", "20240116T090000Z"));
        ical.root.add_child(override_comp);

        assert_eq!(ical.uid(), Some("abc"));
        assert!(ical.root.children[1].is_override());
    }

    #[test]
    fn disagreeing_uids_resolve_to_none() {
        let mut ical = ICalendar::default();

        let mut a = Component::event();
        a.add_property(Property::text("UID", "abc"));
        ical.root.add_child(a);

        let mut b = Component::event();
        b.add_property(Property::text("UID", "def"));
        ical.root.add_child(b);

        assert_eq!(ical.uid(), None);
    }
}
