//! Pagination, sorting, filtering and `fields` projection for list routes.
//!
//! Only the subset of the PocketBase filter language the SDK tests need is
//! understood: a single `field op value` comparison with `=`, `!=` or `~`,
//! optionally wrapped in parentheses.

use std::cmp::Ordering;

use serde::Deserialize;
use serde_json::{json, Map, Value};

pub const DEFAULT_PER_PAGE: u32 = 30;
pub const MAX_PER_PAGE: u32 = 500;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub sort: Option<String>,
    pub filter: Option<String>,
    pub fields: Option<String>,
    #[serde(default)]
    pub skip_total: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct FieldsParams {
    pub fields: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    NotEq,
    Like,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: String,
}

impl Filter {
    pub fn parse(raw: &str) -> Option<Self> {
        let mut expr = raw.trim();
        while expr.starts_with('(') && expr.ends_with(')') {
            expr = expr[1..expr.len() - 1].trim();
        }

        // The leftmost operator wins so that operators inside the quoted value
        // are left alone.
        let (index, token, op) = [("!=", FilterOp::NotEq), ("~", FilterOp::Like), ("=", FilterOp::Eq)]
            .into_iter()
            .filter_map(|(token, op)| expr.find(token).map(|index| (index, token, op)))
            .min_by_key(|(index, _, _)| *index)?;
        let field = expr[..index].trim();
        let value = expr[index + token.len()..].trim();

        let valid_field = !field.is_empty()
            && field
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
        if !valid_field || value.is_empty() {
            return None;
        }

        Some(Self {
            field: field.to_string(),
            op,
            value: unquote(value)?.to_string(),
        })
    }

    pub fn matches(&self, item: &Value) -> bool {
        let actual = match lookup(item, &self.field) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        match self.op {
            FilterOp::Eq => actual == self.value,
            FilterOp::NotEq => actual != self.value,
            FilterOp::Like => actual.to_lowercase().contains(&self.value.to_lowercase()),
        }
    }
}

/// Strip one pair of quotes. A quote left inside, or whitespace in a bare
/// value, means a compound expression such as `a = 'x' && b = 'y'`.
fn unquote(value: &str) -> Option<&str> {
    for quote in ['\'', '"'] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            let inner = &value[1..value.len() - 1];
            return (!inner.contains(quote)).then_some(inner);
        }
    }
    let bare = !value.contains(|c: char| c.is_whitespace() || c == '\'' || c == '"');
    bare.then_some(value)
}

fn lookup<'a>(item: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(item, |value, key| value.get(key))
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
        (None, None) => Ordering::Equal,
    }
}

/// Sort by a comma separated list of columns, `-` prefix for descending.
pub fn sort_items(items: &mut [Value], sort: &str) {
    for key in sort.split(',').map(str::trim).filter(|k| !k.is_empty()).rev() {
        let (field, descending) = match key.strip_prefix('-') {
            Some(field) => (field, true),
            None => (key.strip_prefix('+').unwrap_or(key), false),
        };
        items.sort_by(|a, b| {
            let ordering = compare(lookup(a, field), lookup(b, field));
            if descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
    }
}

/// Keep only the listed (possibly dotted) paths. `*` keeps every key at its
/// level. A blank list leaves the value untouched.
pub fn project(value: &Value, fields: Option<&str>) -> Value {
    let paths: Vec<Vec<&str>> = fields
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(|f| f.split('.').collect())
        .collect();
    if paths.is_empty() {
        return value.clone();
    }

    let mut out = Value::Object(Map::new());
    for path in &paths {
        copy_path(value, &mut out, path);
    }
    out
}

fn copy_path(src: &Value, dst: &mut Value, path: &[&str]) {
    let (Some(src_obj), Some(dst_obj)) = (src.as_object(), dst.as_object_mut()) else {
        return;
    };
    let Some((head, rest)) = path.split_first() else {
        return;
    };

    if *head == "*" {
        for (key, value) in src_obj {
            dst_obj.entry(key.clone()).or_insert_with(|| value.clone());
        }
        return;
    }

    let Some(child) = src_obj.get(*head) else {
        return;
    };
    if rest.is_empty() || !child.is_object() {
        dst_obj.insert(head.to_string(), child.clone());
        return;
    }
    let slot = dst_obj
        .entry(head.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    copy_path(child, slot, rest);
}

/// Error raised for a filter the mock cannot evaluate.
#[derive(Debug, PartialEq, Eq)]
pub struct InvalidFilter;

/// Apply filter, sort, pagination and projection, producing the PocketBase
/// list envelope.
pub fn paginate(mut items: Vec<Value>, params: &ListParams) -> Result<Value, InvalidFilter> {
    if let Some(raw) = params.filter.as_deref().filter(|f| !f.trim().is_empty()) {
        let filter = Filter::parse(raw).ok_or(InvalidFilter)?;
        items.retain(|item| filter.matches(item));
    }
    if let Some(sort) = params.sort.as_deref() {
        sort_items(&mut items, sort);
    }

    let page = params.page.filter(|p| *p > 0).unwrap_or(1);
    let per_page = params
        .per_page
        .filter(|p| *p > 0)
        .unwrap_or(DEFAULT_PER_PAGE)
        .min(MAX_PER_PAGE);

    let total_items = items.len() as i64;
    let total_pages = (total_items + i64::from(per_page) - 1) / i64::from(per_page);

    let start = ((page - 1) as usize).saturating_mul(per_page as usize);
    let page_items: Vec<Value> = items
        .iter()
        .skip(start)
        .take(per_page as usize)
        .map(|item| project(item, params.fields.as_deref()))
        .collect();

    let (total_items, total_pages) = if params.skip_total {
        (-1, -1)
    } else {
        (total_items, total_pages)
    };

    Ok(json!({
        "page": page,
        "perPage": per_page,
        "totalItems": total_items,
        "totalPages": total_pages,
        "items": page_items,
    }))
}
