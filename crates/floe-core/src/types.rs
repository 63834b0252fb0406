//! The type lattice: primitive and nested type definitions.
//!
//! Types are immutable value types. Primitives compare structurally,
//! including decimal precision/scale and fixed length. Nested types carry
//! the field ids of their interior positions (list element, map key/value)
//! drawn from the same id space as struct fields.

use std::fmt;

use once_cell::sync::Lazy;

/// A field of a struct: globally unique id, name, optionality, and type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NestedField {
    pub id: i32,
    pub name: String,
    pub optional: bool,
    pub field_type: Type,
}

impl NestedField {
    pub fn optional(id: i32, name: impl Into<String>, field_type: Type) -> Self {
        Self {
            id,
            name: name.into(),
            optional: true,
            field_type,
        }
    }

    pub fn required(id: i32, name: impl Into<String>, field_type: Type) -> Self {
        Self {
            id,
            name: name.into(),
            optional: false,
            field_type,
        }
    }

    pub fn is_required(&self) -> bool {
        !self.optional
    }
}

impl fmt::Display for NestedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}: {} {}",
            self.id,
            self.name,
            if self.optional { "optional" } else { "required" },
            self.field_type
        )
    }
}

/// A struct type: an ordered list of named fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructType {
    pub fields: Vec<NestedField>,
}

impl StructType {
    pub fn new(fields: Vec<NestedField>) -> Self {
        Self { fields }
    }

    /// Look up a direct child field by name.
    pub fn field(&self, name: &str) -> Option<&NestedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Look up a direct child field by id.
    pub fn field_by_id(&self, id: i32) -> Option<&NestedField> {
        self.fields.iter().find(|f| f.id == id)
    }
}

/// A list type: element id, element optionality, element type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListType {
    pub element_id: i32,
    pub element_optional: bool,
    pub element_type: Box<Type>,
}

impl ListType {
    pub fn of_optional(element_id: i32, element_type: Type) -> Self {
        Self {
            element_id,
            element_optional: true,
            element_type: Box::new(element_type),
        }
    }

    pub fn of_required(element_id: i32, element_type: Type) -> Self {
        Self {
            element_id,
            element_optional: false,
            element_type: Box::new(element_type),
        }
    }

    /// The element position viewed as a pseudo-field named "element".
    pub fn element_field(&self) -> NestedField {
        NestedField {
            id: self.element_id,
            name: "element".to_string(),
            optional: self.element_optional,
            field_type: (*self.element_type).clone(),
        }
    }
}

/// A map type: key and value ids, value optionality, key and value types.
/// Map keys are always required.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MapType {
    pub key_id: i32,
    pub value_id: i32,
    pub value_optional: bool,
    pub key_type: Box<Type>,
    pub value_type: Box<Type>,
}

impl MapType {
    pub fn of_optional(key_id: i32, value_id: i32, key_type: Type, value_type: Type) -> Self {
        Self {
            key_id,
            value_id,
            value_optional: true,
            key_type: Box::new(key_type),
            value_type: Box::new(value_type),
        }
    }

    pub fn of_required(key_id: i32, value_id: i32, key_type: Type, value_type: Type) -> Self {
        Self {
            key_id,
            value_id,
            value_optional: false,
            key_type: Box::new(key_type),
            value_type: Box::new(value_type),
        }
    }

    pub fn key_field(&self) -> NestedField {
        NestedField {
            id: self.key_id,
            name: "key".to_string(),
            optional: false,
            field_type: (*self.key_type).clone(),
        }
    }

    pub fn value_field(&self) -> NestedField {
        NestedField {
            id: self.value_id,
            name: "value".to_string(),
            optional: self.value_optional,
            field_type: (*self.value_type).clone(),
        }
    }
}

/// A closed sum of all supported types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Date,
    Time,
    Timestamp { adjusted_to_utc: bool },
    String,
    Uuid,
    Fixed(usize),
    Binary,
    Decimal { precision: u32, scale: u32 },
    Struct(StructType),
    List(ListType),
    Map(MapType),
}

impl Type {
    pub fn timestamp() -> Self {
        Type::Timestamp {
            adjusted_to_utc: false,
        }
    }

    pub fn timestamptz() -> Self {
        Type::Timestamp {
            adjusted_to_utc: true,
        }
    }

    pub fn is_primitive(&self) -> bool {
        !self.is_nested()
    }

    pub fn is_nested(&self) -> bool {
        matches!(self, Type::Struct(_) | Type::List(_) | Type::Map(_))
    }

    pub fn is_struct(&self) -> bool {
        matches!(self, Type::Struct(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Type::List(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Type::Map(_))
    }

    /// View as a struct type. Panics if this is not a struct; callers must
    /// check `is_struct` first.
    pub fn as_struct(&self) -> &StructType {
        match self {
            Type::Struct(s) => s,
            other => panic!("not a struct type: {other}"),
        }
    }

    /// View as a list type. Panics if this is not a list.
    pub fn as_list(&self) -> &ListType {
        match self {
            Type::List(l) => l,
            other => panic!("not a list type: {other}"),
        }
    }

    /// View as a map type. Panics if this is not a map.
    pub fn as_map(&self) -> &MapType {
        match self {
            Type::Map(m) => m,
            other => panic!("not a map type: {other}"),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Boolean => write!(f, "boolean"),
            Type::Int => write!(f, "int"),
            Type::Long => write!(f, "long"),
            Type::Float => write!(f, "float"),
            Type::Double => write!(f, "double"),
            Type::Date => write!(f, "date"),
            Type::Time => write!(f, "time"),
            Type::Timestamp {
                adjusted_to_utc: true,
            } => write!(f, "timestamptz"),
            Type::Timestamp {
                adjusted_to_utc: false,
            } => write!(f, "timestamp"),
            Type::String => write!(f, "string"),
            Type::Uuid => write!(f, "uuid"),
            Type::Fixed(len) => write!(f, "fixed[{len}]"),
            Type::Binary => write!(f, "binary"),
            Type::Decimal { precision, scale } => write!(f, "decimal({precision},{scale})"),
            Type::Struct(s) => {
                write!(f, "struct<")?;
                for (i, field) in s.fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{field}")?;
                }
                write!(f, ">")
            }
            Type::List(l) => write!(f, "list<{}>", l.element_type),
            Type::Map(m) => write!(f, "map<{}, {}>", m.key_type, m.value_type),
        }
    }
}

const MAX_DECIMAL_BYTES: usize = 24;
const MAX_DECIMAL_PRECISION: usize = 40;

// For each byte length, the largest decimal precision it can hold:
// floor(log10(2^(8*len - 1) - 1)).
static MAX_PRECISION: Lazy<[u32; MAX_DECIMAL_BYTES]> = Lazy::new(|| {
    let mut table = [0u32; MAX_DECIMAL_BYTES];
    for (len, slot) in table.iter_mut().enumerate() {
        let bits = 8 * len as i32 - 1;
        // len == 0 produces a negative argument whose log10 is NaN; the
        // saturating cast pins it to 0, matching a zero-byte decimal.
        *slot = (2f64.powi(bits) - 1.0).log10().floor() as u32;
    }
    table
});

// For each precision, the smallest byte length that can hold it.
static REQUIRED_LENGTH: Lazy<[usize; MAX_DECIMAL_PRECISION]> = Lazy::new(|| {
    let mut table = [0usize; MAX_DECIMAL_PRECISION];
    for (precision, slot) in table.iter_mut().enumerate() {
        let found = (0..MAX_DECIMAL_BYTES).find(|&len| precision as u32 <= MAX_PRECISION[len]);
        match found {
            Some(len) => *slot = len,
            None => panic!("could not find required length for precision {precision}"),
        }
    }
    table
});

/// The largest decimal precision that fits in `num_bytes` bytes.
///
/// Panics if `num_bytes` is not in `[0, 24)`.
pub fn decimal_max_precision(num_bytes: usize) -> u32 {
    assert!(
        num_bytes < MAX_DECIMAL_BYTES,
        "unsupported decimal length: {num_bytes}"
    );
    MAX_PRECISION[num_bytes]
}

/// The smallest number of bytes that can hold `precision` decimal digits.
///
/// Panics if `precision` is not in `[0, 40)`.
pub fn decimal_required_bytes(precision: u32) -> usize {
    assert!(
        (precision as usize) < MAX_DECIMAL_PRECISION,
        "unsupported decimal precision: {precision}"
    );
    REQUIRED_LENGTH[precision as usize]
}
