//! Naming conventions for default table names

/// Convert a PascalCase type name to snake_case (`BlogPost` -> `blog_post`)
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut result = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev_lower = i > 0 && (chars[i - 1].is_lowercase() || chars[i - 1].is_ascii_digit());
            let acronym_end = i > 0
                && chars[i - 1].is_uppercase()
                && chars.get(i + 1).map_or(false, |next| next.is_lowercase());
            if prev_lower || acronym_end {
                result.push('_');
            }
            result.extend(c.to_lowercase());
        } else {
            result.push(c);
        }
    }

    result
}

/// Simple pluralization (English-centric)
pub fn pluralize(name: &str) -> String {
    if name.ends_with('y')
        && !name.ends_with("ay")
        && !name.ends_with("ey")
        && !name.ends_with("iy")
        && !name.ends_with("oy")
        && !name.ends_with("uy")
    {
        format!("{}ies", &name[..name.len() - 1])
    } else if name.ends_with('s')
        || name.ends_with("sh")
        || name.ends_with("ch")
        || name.ends_with('x')
        || name.ends_with('z')
    {
        format!("{}es", name)
    } else {
        format!("{}s", name)
    }
}

/// Default table name for an entity type: snake_case, pluralized
pub fn default_table_name(type_name: &str) -> String {
    pluralize(&to_snake_case(type_name))
}
