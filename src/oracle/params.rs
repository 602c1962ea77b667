use std::borrow::Cow;

use crate::types::{BindType, BindValue, Params};

/// Prefix the query layer puts in front of returning bind names.
pub const RETURNING_PREFIX: &str = "returning$";

/// Add output binds for `returning_fields` to a copy of `params`.
///
/// Positional params get the out binds appended in field order; named params get one entry per
/// field, replacing an existing bind of the same name. Unknown type names produce untyped out
/// binds. The caller's params are never modified.
#[must_use]
pub fn with_returning_binds<'a>(
    params: &'a Params,
    returning_fields: Option<&[(String, String)]>,
) -> Cow<'a, Params> {
    let Some(fields) = returning_fields.filter(|f| !f.is_empty()) else {
        return Cow::Borrowed(params);
    };

    let mut expanded = params.clone();
    for (name, type_name) in fields {
        let out = BindValue::Out {
            name: name.clone(),
            bind_type: BindType::from_type_name(type_name),
        };
        match &mut expanded {
            Params::Positional(values) => values.push(out),
            Params::Named(values) => {
                if let Some(slot) = values.iter_mut().find(|(k, _)| k == name) {
                    slot.1 = out;
                } else {
                    values.push((name.clone(), out));
                }
            }
        }
    }
    Cow::Owned(expanded)
}

/// Strip the returning prefix from an out-bind name.
#[must_use]
pub fn returning_key(bind_name: &str) -> &str {
    bind_name.strip_prefix(RETURNING_PREFIX).unwrap_or(bind_name)
}
