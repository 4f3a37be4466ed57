/// Summary counters from JaCoCo XML coverage reports.
///
/// JaCoCo XML structure:
///   <report name="...">
///     <sessioninfo id="..." start="..." dump="..."/>
///     <package name="com/example">
///       <class name="com/example/Foo" sourcefilename="Foo.java">
///         <method name="doStuff" desc="()V" line="10">
///           <counter type="LINE" missed="0" covered="3"/>
///           ...
///         </method>
///         <counter type="LINE" missed="1" covered="5"/>
///       </class>
///       ...
///       <counter type="LINE" missed="1" covered="5"/>
///     </package>
///     <counter type="INSTRUCTION" missed="..." covered="..."/>
///     <counter type="BRANCH" missed="..." covered="..."/>
///     <counter type="LINE" missed="..." covered="..."/>
///     <counter type="COMPLEXITY" missed="..." covered="..."/>
///     <counter type="METHOD" missed="..." covered="..."/>
///     <counter type="CLASS" missed="..." covered="..."/>
///   </report>
///
/// Counters appear at every level of the tree. The report-level ones come
/// last in document order, so reading every `<counter>` and keeping the last
/// value per type yields the totals.
use std::path::Path;

use log::{debug, warn};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{DroidcovError, Result};
use crate::model::{percent, CoverageRecord};

fn get_attr(e: &BytesStart, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == name)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

fn get_count(e: &BytesStart, name: &[u8]) -> Result<u64> {
    let raw = get_attr(e, name).ok_or_else(|| {
        DroidcovError::Parse(format!(
            "counter without '{}' attribute",
            String::from_utf8_lossy(name)
        ))
    })?;
    raw.parse()
        .map_err(|_| DroidcovError::Parse(format!("invalid counter value '{}'", raw)))
}

/// Percentage of a `<counter>` element, for the four types we report.
fn read_counter(e: &BytesStart) -> Result<Option<(&'static str, f64)>> {
    let counter_type = match get_attr(e, b"type").as_deref() {
        Some("LINE") => "LINE",
        Some("BRANCH") => "BRANCH",
        Some("METHOD") => "METHOD",
        Some("CLASS") => "CLASS",
        _ => return Ok(None),
    };
    let missed = get_count(e, b"missed")?;
    let covered = get_count(e, b"covered")?;
    Ok(Some((counter_type, percent(covered, missed))))
}

fn apply_counter(e: &BytesStart, totals: &mut [f64; 4]) -> Result<()> {
    if e.name().as_ref() != b"counter" {
        return Ok(());
    }
    if let Some((counter_type, pct)) = read_counter(e)? {
        let slot = match counter_type {
            "LINE" => 0,
            "BRANCH" => 1,
            "METHOD" => 2,
            _ => 3,
        };
        totals[slot] = pct;
    }
    Ok(())
}

/// Parse the LINE, BRANCH, METHOD and CLASS counters of a JaCoCo XML report.
///
/// A document that ends with elements still open (a report whose writer
/// died midway) is rejected; its last counters are not the report totals.
pub fn parse_counters(input: &[u8]) -> Result<CoverageRecord> {
    let mut reader = Reader::from_reader(input);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut seen_element = false;
    let mut open = 0usize;
    // line, branch, method, class
    let mut totals = [0.0; 4];

    loop {
        match reader.read_event_into(&mut buf) {
            Err(e) => {
                return Err(DroidcovError::Xml {
                    source: e,
                    position: reader.buffer_position(),
                })
            }
            Ok(Event::Eof) => break,
            Ok(Event::Start(ref e)) => {
                seen_element = true;
                open += 1;
                apply_counter(e, &mut totals)?;
            }
            Ok(Event::Empty(ref e)) => {
                seen_element = true;
                apply_counter(e, &mut totals)?;
            }
            Ok(Event::End(_)) => open = open.saturating_sub(1),
            _ => {}
        }
        buf.clear();
    }

    if !seen_element {
        return Err(DroidcovError::Parse("no element found".to_string()));
    }
    if open > 0 {
        return Err(DroidcovError::Parse(format!(
            "unclosed element at end of input (position {}, {} still open)",
            reader.buffer_position(),
            open
        )));
    }

    let [line, branch, method, class] = totals;
    Ok(CoverageRecord::new(line, branch, method, class))
}

/// Read a report file. A missing or unparsable report yields an invalid
/// record rather than an error.
pub fn read_report(path: &Path) -> CoverageRecord {
    if !path.is_file() {
        debug!("no coverage report at {}", path.display());
        return CoverageRecord::invalid();
    }
    let content = match std::fs::read(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("cannot read {}: {}", path.display(), e);
            return CoverageRecord::invalid();
        }
    };
    match parse_counters(&content) {
        Ok(record) => {
            debug!(
                "Line: {}, Branch: {}, Method: {}, Class: {}",
                record.line, record.branch, record.method, record.class
            );
            record
        }
        Err(e) => {
            warn!("cannot parse {}: {}", path.display(), e);
            CoverageRecord::invalid()
        }
    }
}
