// # Zone-Map File Format
//
// One entry per line, fields separated by a single space, every line
// terminated by `\n`:
//
// ```text
// example.com 023e105f4ecef8ad9ca31a8372d0c353
// www.example.com 023e105f4ecef8ad9ca31a8372d0c353 372e67954025e0ba6aaa6d586b9e0b59 true 203.0.113.10
// txt.example.com 023e105f4ecef8ad9ca31a8372d0c353 9a7806061c88ada191ed06f989cc3dac false
// ```
//
// - Two fields: zone-level entry (`domain zone_id`)
// - Five fields: record entry (`domain zone_id record_id proxied content`);
//   empty content leaves a trailing delimiter
//
// There is no escaping. Values containing the delimiter or a newline are
// rejected before they reach this module.
//
// ## Damage tolerance
//
// Lines that do not parse, or are not valid UTF-8, are skipped with a
// warning rather than repaired. A final line without
// its terminating newline is a torn write and is dropped even if it would
// parse, since a truncated record can still look like a valid zone entry.

use super::{UpsertOutcome, ZoneMap, ZoneMapEntry};

/// Field separator
pub const DELIMITER: char = ' ';

/// Parsed file plus a count of lines that were thrown away
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedZoneMap {
    pub map: ZoneMap,
    pub skipped: usize,
}

/// Render one entry without the trailing newline
pub fn format_entry(entry: &ZoneMapEntry) -> String {
    match &entry.record_id {
        None => format!("{}{DELIMITER}{}", entry.domain, entry.zone_id),
        Some(record_id) => format!(
            "{}{d}{}{d}{}{d}{}{d}{}",
            entry.domain,
            entry.zone_id,
            record_id,
            entry.proxied,
            entry.content,
            d = DELIMITER
        ),
    }
}

/// Parse one line (without its newline)
pub fn parse_line(line: &str) -> Result<ZoneMapEntry, String> {
    let fields: Vec<&str> = line.split(DELIMITER).collect();

    let entry = match fields.as_slice() {
        [domain, zone_id] => ZoneMapEntry::zone(*domain, *zone_id),
        [domain, zone_id, record_id, proxied, content] => {
            let proxied = parse_proxied(proxied)
                .ok_or_else(|| format!("invalid proxied flag {:?}", proxied))?;
            ZoneMapEntry::record(*domain, *zone_id, *record_id, proxied, *content)
        }
        other => return Err(format!("expected 2 or 5 fields, found {}", other.len())),
    };

    entry.validate().map_err(|e| e.to_string())?;
    Ok(entry)
}

fn parse_proxied(value: &str) -> Option<bool> {
    match value {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Render a whole map, one terminated line per entry
pub fn render(map: &ZoneMap) -> String {
    let mut out = String::new();
    for entry in map.iter() {
        out.push_str(&format_entry(entry));
        out.push('\n');
    }
    out
}

/// Parse file contents
pub fn parse(text: &str) -> ParsedZoneMap {
    let mut parsed = ParsedZoneMap::default();

    let (complete, torn) = match text.rfind('\n') {
        Some(idx) => (&text[..=idx], &text[idx + 1..]),
        None => ("", text),
    };

    if !torn.is_empty() {
        tracing::warn!(
            "Zone map ends with an unterminated line ({} bytes); dropping it as a torn write",
            torn.len()
        );
        parsed.skipped += 1;
    }

    for (lineno, line) in complete.lines().enumerate() {
        if line.is_empty() {
            continue;
        }

        match parse_line(line) {
            Ok(entry) => {
                let domain = entry.domain.clone();
                // parse_line already validated the entry, so upsert cannot fail
                if let Ok(UpsertOutcome::Updated) = parsed.map.upsert(entry) {
                    tracing::warn!(
                        "Zone map line {} repeats domain '{}'; later line wins",
                        lineno + 1,
                        domain
                    );
                }
            }
            Err(reason) => {
                tracing::warn!("Skipping zone map line {}: {}", lineno + 1, reason);
                parsed.skipped += 1;
            }
        }
    }

    parsed
}

/// Parse raw file bytes, dropping lines that are not valid UTF-8
pub fn parse_bytes(bytes: &[u8]) -> ParsedZoneMap {
    let mut text = String::with_capacity(bytes.len());
    let mut invalid = 0;

    let mut segments = bytes.split(|b| *b == b'\n').enumerate().peekable();
    while let Some((lineno, segment)) = segments.next() {
        let last = segments.peek().is_none();
        match std::str::from_utf8(segment) {
            Ok(line) => {
                text.push_str(line);
                if !last {
                    text.push('\n');
                }
            }
            // An unterminated tail is dropped by parse() as a torn write
            Err(_) if last => text.push_str(&String::from_utf8_lossy(segment)),
            Err(e) => {
                tracing::warn!("Skipping zone map line {}: not valid UTF-8 ({})", lineno + 1, e);
                invalid += 1;
            }
        }
    }

    let mut parsed = parse(&text);
    parsed.skipped += invalid;
    parsed
}
