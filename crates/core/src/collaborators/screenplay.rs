//! Slugline-based screenplay parser.

use sk_protocol::{ParsedScript, SceneHeading};

const SLUG_PREFIXES: [&str; 6] = ["INT./EXT.", "EXT./INT.", "INT/EXT", "I/E", "INT.", "EXT."];

/// Split a screenplay into scenes at every slugline.
///
/// Text before the first slugline (title pages, notes) is dropped. A script
/// without any slugline becomes a single untitled scene.
pub fn parse_screenplay(script: &str) -> ParsedScript {
    let mut parsed = ParsedScript::default();
    let mut current: Option<(SceneHeading, Vec<&str>)> = None;

    for line in script.lines() {
        if let Some(heading) = parse_slugline(line) {
            if let Some((heading, body)) = current.take() {
                push_scene(&mut parsed, heading, &body);
            }
            current = Some((heading, Vec::new()));
        } else if let Some((_, body)) = current.as_mut() {
            body.push(line);
        }
    }

    if let Some((heading, body)) = current {
        push_scene(&mut parsed, heading, &body);
    } else if !script.trim().is_empty() {
        parsed.scene_headings.push(SceneHeading::default());
        parsed.scene_texts.push(script.trim().to_string());
    }

    parsed
}

fn push_scene(parsed: &mut ParsedScript, heading: SceneHeading, body: &[&str]) {
    parsed.scene_headings.push(heading);
    parsed.scene_texts.push(body.join("\n").trim().to_string());
}

/// Parse `INT. LIGHTHOUSE LAMP ROOM - NIGHT` into its parts.
pub fn parse_slugline(line: &str) -> Option<SceneHeading> {
    let slug = line.trim();
    let upper = slug.to_uppercase();
    let prefix = SLUG_PREFIXES.iter().find(|p| upper.starts_with(*p))?;

    let tail = slug.get(prefix.len()..)?;
    let rest = tail.trim();
    // bare prefixes need a separator: "I/EXIT" is not a slugline
    if !prefix.ends_with('.') && !rest.is_empty() && !tail.starts_with(' ') {
        return None;
    }

    let (location, time_of_day) = match rest.rsplit_once(" - ") {
        Some((loc, tod)) => (loc.trim(), Some(tod.trim())),
        None => (rest, None),
    };

    Some(SceneHeading {
        slug: slug.to_string(),
        location: Some(location.to_string()).filter(|l| !l.is_empty()),
        time_of_day: time_of_day.map(str::to_string).filter(|t| !t.is_empty()),
    })
}
