/// Drops `&x` colour codes. A trailing lone `&` is dropped as well.
pub fn strip_color_codes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '&' {
            chars.next();
            continue;
        }
        out.push(c);
    }
    out
}

pub fn is_url(text: &str) -> bool {
    text.starts_with("http://") || text.starts_with("https://")
}
