//! Record reflection: which struct field feeds or receives which column.
//!
//! A [`Record`] describes its members through [`Record::field_defs`] (usually
//! generated by `#[derive(Record)]`) and exposes index-path based accessors.
//! [`describe`] flattens nested records into a list of [`Field`]s, resolves
//! column names from tags, and caches the result per type.

use crate::error::{OrmError, OrmResult};
use crate::value::Value;
use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

/// A struct whose fields map to columns.
///
/// Paths are sequences of member indices: `[2]` is the third member,
/// `[1, 0]` is the first member of the record flattened into the second.
pub trait Record {
    /// One entry per member, in declaration order.
    fn field_defs() -> Vec<FieldDef>
    where
        Self: Sized;

    /// Read the value at `path`.
    fn get(&self, path: &[usize]) -> OrmResult<Value>;

    /// Write `value` at `path`, converting it to the member's type.
    fn set(&mut self, path: &[usize], value: Value) -> OrmResult<()>;
}

/// Static description of one record member.
#[derive(Clone, Debug)]
pub struct FieldDef {
    pub member: &'static str,
    /// Raw tag, `"name,option,..."`.
    pub tag: Option<&'static str>,
    /// Non-public members never map to columns.
    pub public: bool,
    /// Set for members whose fields are spliced into the parent.
    pub nested: Option<fn() -> Vec<FieldDef>>,
}

impl FieldDef {
    pub const fn leaf(member: &'static str, tag: Option<&'static str>, public: bool) -> Self {
        Self {
            member,
            tag,
            public,
            nested: None,
        }
    }

    pub fn flatten<R: Record>(member: &'static str, tag: Option<&'static str>, public: bool) -> Self {
        Self {
            member,
            tag,
            public,
            nested: Some(R::field_defs),
        }
    }
}

/// Parsed form of a field tag.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldTag<'a> {
    pub name: Option<&'a str>,
    pub omit_empty: bool,
    pub skip: bool,
}

impl<'a> FieldTag<'a> {
    /// Parse `"name,omitempty"`. A name of `-` excludes the member; an empty
    /// name falls back to the member name.
    pub fn parse(tag: &'a str) -> Self {
        let mut parts = tag.split(',');
        let name = parts.next().map(str::trim).unwrap_or_default();
        let mut out = FieldTag::default();
        if name == "-" {
            out.skip = true;
            return out;
        }
        if !name.is_empty() {
            out.name = Some(name);
        }
        out.omit_empty = parts.any(|opt| opt.trim() == "omitempty");
        out
    }
}

/// A resolved column mapping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub path: Vec<usize>,
    pub column: String,
    pub omit_empty: bool,
}

/// Expand field definitions into column mappings.
pub fn derive_fields(type_name: &str, defs: &[FieldDef]) -> OrmResult<Vec<Field>> {
    let mut out = Vec::new();
    collect(defs, &mut Vec::new(), &mut out);
    let mut seen = HashSet::new();
    for field in &out {
        if !seen.insert(field.column.as_str()) {
            return Err(OrmError::shape(format!(
                "{type_name} maps more than one field to column \"{}\"",
                field.column
            )));
        }
    }
    Ok(out)
}

fn collect(defs: &[FieldDef], prefix: &mut Vec<usize>, out: &mut Vec<Field>) {
    for (index, def) in defs.iter().enumerate() {
        if !def.public {
            continue;
        }
        let tag = def.tag.map(FieldTag::parse).unwrap_or_default();
        if tag.skip {
            continue;
        }
        prefix.push(index);
        match def.nested {
            Some(nested) => collect(&nested(), prefix, out),
            None => out.push(Field {
                path: prefix.clone(),
                column: tag.name.unwrap_or(def.member).to_string(),
                omit_empty: tag.omit_empty,
            }),
        }
        prefix.pop();
    }
}

type Cache = RwLock<HashMap<TypeId, Arc<[Field]>>>;

fn cache() -> &'static Cache {
    static CACHE: OnceLock<Cache> = OnceLock::new();
    CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Column mappings of `R`, computed once per type.
pub fn describe<R: Record + 'static>() -> OrmResult<Arc<[Field]>> {
    let id = TypeId::of::<R>();
    if let Some(fields) = cache()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&id)
    {
        return Ok(fields.clone());
    }

    let fields: Arc<[Field]> = derive_fields(std::any::type_name::<R>(), &R::field_defs())?.into();
    let mut map = cache().write().unwrap_or_else(PoisonError::into_inner);
    Ok(map.entry(id).or_insert(fields).clone())
}

/// For each column, the field that maps to it (`None` = skip the column).
///
/// Exact name matches win; otherwise names are compared ASCII
/// case-insensitively.
pub fn align_fields_to_columns<S: AsRef<str>>(columns: &[S], fields: &[Field]) -> Vec<Option<Field>> {
    columns
        .iter()
        .map(|column| {
            let column = column.as_ref();
            fields
                .iter()
                .find(|f| f.column == column)
                .or_else(|| fields.iter().find(|f| f.column.eq_ignore_ascii_case(column)))
                .cloned()
        })
        .collect()
}
