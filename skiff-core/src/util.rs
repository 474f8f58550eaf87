use convert_case::{Boundary, Case, Casing};

/// Word boundaries of derived names: digits stay attached to the word before them.
const NAME_BOUNDARIES: [Boundary; 4] = [
    Boundary::UNDERSCORE,
    Boundary::LOWER_UPPER,
    Boundary::DIGIT_UPPER,
    Boundary::ACRONYM,
];

pub fn separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut len = out.len();
    for v in values {
        if out.len() > len {
            out.push_str(separator);
        }
        len = out.len();
        f(out, v);
    }
}

/// True when `fragment` starts with the `where` keyword, ignoring case and leading whitespace.
pub fn starts_with_where(fragment: &str) -> bool {
    let fragment = fragment.trim_start();
    let Some(head) = fragment.get(..5) else {
        return false;
    };
    head.eq_ignore_ascii_case("where")
        && fragment[5..]
            .chars()
            .next()
            .is_none_or(|c| c.is_whitespace() || c == '(')
}

/// Column name derived from an attribute name: `firstName` becomes `first_name`.
pub fn column_name_of(attribute: &str) -> String {
    let name = attribute.strip_prefix('_').unwrap_or(attribute);
    name.with_boundaries(&NAME_BOUNDARIES).to_case(Case::Snake)
}

/// Relation name derived from a type name: `my_app::DepartmentRecord` becomes `department`.
pub fn relation_name_of(type_name: &str) -> String {
    let name = type_name.split('<').next().unwrap_or(type_name);
    let name = name.rsplit("::").next().unwrap_or(name);
    let name = ["Record", "Row"]
        .iter()
        .find_map(|suffix| name.strip_suffix(suffix).filter(|v| !v.is_empty()))
        .unwrap_or(name);
    name.with_boundaries(&NAME_BOUNDARIES).to_case(Case::Snake)
}

/// Leading part of `text` at most `max` bytes long, cut on a char boundary.
pub fn truncated(text: &str, max: usize) -> (&str, bool) {
    if text.len() <= max {
        return (text, false);
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    (&text[..end], true)
}

#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {{
        let (head, cut) = $crate::truncated(&$query, 497);
        format!("{}{}\n", head.trim_end(), if cut { "..." } else { "" })
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn where_prefix() {
        assert!(starts_with_where("where id = ?"));
        assert!(starts_with_where("  WHERE id = ?"));
        assert!(starts_with_where("\n\tWhere(id = ?)"));
        assert!(starts_with_where("where"));
        assert!(!starts_with_where("select * from t where id = ?"));
        assert!(!starts_with_where("whereabouts = 1"));
        assert!(!starts_with_where("whe"));
        assert!(!starts_with_where(""));
    }

    #[test]
    fn derived_names() {
        assert_eq!(column_name_of("firstName"), "first_name");
        assert_eq!(column_name_of("first_name"), "first_name");
        assert_eq!(column_name_of("_alpha"), "alpha");
        assert_eq!(column_name_of("id"), "id");
        assert_eq!(column_name_of("int32"), "int32");
        assert_eq!(column_name_of("address2Line"), "address2_line");
        assert_eq!(column_name_of("HTTPStatus"), "http_status");
        assert_eq!(relation_name_of("app::Address2"), "address2");
        assert_eq!(relation_name_of("app::model::DepartmentRecord"), "department");
        assert_eq!(relation_name_of("OrderLine"), "order_line");
        assert_eq!(relation_name_of("app::AuditRow"), "audit");
        assert_eq!(relation_name_of("Record"), "record");
        assert_eq!(relation_name_of("app::Wrapper<i32>"), "wrapper");
    }

    #[test]
    fn truncation() {
        assert_eq!(truncated("select 1", 497), ("select 1", false));
        let long = "é".repeat(300);
        let (head, cut) = truncated(&long, 497);
        assert!(cut);
        assert_eq!(head.len(), 496);
    }
}
