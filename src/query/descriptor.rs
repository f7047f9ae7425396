use std::fmt;

/// Document type of event records in the content store.
pub const EVENT_TYPE: &str = "event";
/// Name of the query parameter carrying the caller's "now".
pub const NOW_PARAM: &str = "now";
/// Size of the upcoming-events window.
pub const UPCOMING_EVENTS_LIMIT: u32 = 10;

/// Immutable description of a time-ordered, filtered, windowed record list.
///
/// Two descriptors with the same structural content compare equal and derive
/// the same [`super::QueryKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryDescriptor {
    entity_type: String,
    filters: Vec<Filter>,
    order: Vec<SortOrder>,
    window: Window,
    projection: Projection,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Filter {
    GreaterThan { field: String, value: FilterValue },
}

/// Right-hand side of a filter predicate.
///
/// `Param` is bound by name at execution time, which keeps the descriptor
/// stable while the bound value (such as the current instant) changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FilterValue {
    Param(String),
    Str(String),
    Int(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortOrder {
    pub field: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Window {
    pub offset: u32,
    pub limit: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Projection(Vec<ProjectedField>);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProjectedField {
    Field(String),
    /// Follow a reference and keep only the listed fields of the target.
    Deref { field: String, fields: Vec<String> },
}

impl QueryDescriptor {
    pub fn new(
        entity_type: impl Into<String>,
        filters: Vec<Filter>,
        order: Vec<SortOrder>,
        window: Window,
        projection: Projection,
    ) -> Self {
        Self {
            entity_type: entity_type.into(),
            filters,
            order,
            window,
            projection,
        }
    }

    /// The one supported query: the next ten events after `$now`, soonest first.
    pub fn upcoming_events() -> Self {
        Self::new(
            EVENT_TYPE,
            vec![Filter::GreaterThan {
                field: "date".to_string(),
                value: FilterValue::Param(NOW_PARAM.to_string()),
            }],
            vec![SortOrder {
                field: "date".to_string(),
                direction: SortDirection::Asc,
            }],
            Window {
                offset: 0,
                limit: UPCOMING_EVENTS_LIMIT,
            },
            Projection(vec![
                ProjectedField::field("_id"),
                ProjectedField::field("name"),
                ProjectedField::field("slug"),
                ProjectedField::field("date"),
                ProjectedField::field("doorsOpen"),
                ProjectedField::deref("venue", &["name", "city", "country"]),
                ProjectedField::deref("headline", &["name"]),
                ProjectedField::field("image"),
                ProjectedField::field("tickets"),
            ]),
        )
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn order(&self) -> &[SortOrder] {
        &self.order
    }

    pub fn window(&self) -> Window {
        self.window
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Names of the parameters the query expects to be bound at execution time.
    pub fn params(&self) -> impl Iterator<Item = &str> {
        self.filters.iter().filter_map(|filter| match filter {
            Filter::GreaterThan {
                value: FilterValue::Param(name),
                ..
            } => Some(name.as_str()),
            Filter::GreaterThan { .. } => None,
        })
    }

    /// Render the descriptor in the store's query language.
    pub fn to_groq(&self) -> String {
        self.to_string()
    }
}

impl Projection {
    pub fn new(fields: Vec<ProjectedField>) -> Self {
        Self(fields)
    }

    pub fn fields(&self) -> &[ProjectedField] {
        &self.0
    }
}

impl ProjectedField {
    pub fn field(name: &str) -> Self {
        Self::Field(name.to_string())
    }

    pub fn deref(name: &str, fields: &[&str]) -> Self {
        Self::Deref {
            field: name.to_string(),
            fields: fields.iter().map(|field| (*field).to_string()).collect(),
        }
    }
}

impl fmt::Display for QueryDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "*[_type == {}", string_literal(&self.entity_type))?;
        for filter in &self.filters {
            write!(f, " && {filter}")?;
        }
        f.write_str("]")?;

        if !self.order.is_empty() {
            f.write_str(" | order(")?;
            for (idx, order) in self.order.iter().enumerate() {
                if idx > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{order}")?;
            }
            f.write_str(")")?;
        }

        let Window { offset, limit } = self.window;
        write!(f, "[{offset}...{}]", offset.saturating_add(limit))?;
        write!(f, " {}", self.projection)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GreaterThan { field, value } => write!(f, "{field} > {value}"),
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Param(name) => write!(f, "${name}"),
            Self::Str(value) => f.write_str(&string_literal(value)),
            Self::Int(value) => write!(f, "{value}"),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = match self.direction {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        };
        write!(f, "{} {direction}", self.field)
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (idx, field) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            match field {
                ProjectedField::Field(name) => f.write_str(name)?,
                ProjectedField::Deref { field, fields } => {
                    write!(f, "{field}->{{{}}}", fields.join(", "))?;
                }
            }
        }
        f.write_str("}")
    }
}

fn string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}
