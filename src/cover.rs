//! Deterministic cover gradient colours.

/// Generate the two gradient colours (`#rrggbb`) for a title's placeholder cover.
///
/// The title picks the base hue and the author shifts the second one, so
/// the same book always renders the same cover.
pub fn generate_cover_colors(title: &str, author: &str) -> (String, String) {
    let title_hash = hash_str(title);
    let author_hash = hash_str(author);

    let hue = (title_hash % 360) as f32;
    let shift = 30 + (author_hash % 120);
    let second_hue = ((title_hash % 360 + shift) % 360) as f32;

    let first = hsv_to_rgb(hue, 0.45, 0.55);
    let second = hsv_to_rgb(second_hue, 0.55, 0.35);

    (to_hex(first), to_hex(second))
}

/// FNV-1a, stable across platforms and releases.
fn hash_str(s: &str) -> u32 {
    s.bytes().fold(0x811c_9dc5u32, |acc, b| {
        (acc ^ b as u32).wrapping_mul(0x0100_0193)
    })
}

fn to_hex((r, g, b): (u8, u8, u8)) -> String {
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

/// Convert HSV to RGB.
fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (u8, u8, u8) {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match (h / 60.0) as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    (
        ((r + m) * 255.0) as u8,
        ((g + m) * 255.0) as u8,
        ((b + m) * 255.0) as u8,
    )
}
