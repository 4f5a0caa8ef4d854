//! Print the dependency coordinates of a Maven build descriptor as a table.
use crate::error::{Error, Result};
use std::{
    fs::File,
    io::{self, BufReader, Read, Write},
    path::Path,
};
use xml::reader::{ParserConfig, XmlEvent};

const HEADER: [&str; 6] = [
    "Group ID",
    "Artifact ID",
    "Version",
    "Type",
    "Classifier",
    "Scope",
];
const UNDERLINE: &str = "____________________________________________";

/// The coordinate elements looked up in each `dependency`, in column order.
const COORDINATES: [&str; 6] = [
    "groupId",
    "artifactId",
    "version",
    "type",
    "classifier",
    "scope",
];

/// One row of the report. Missing coordinates are empty strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dependency {
    pub coordinates: [String; 6],
}

/// A `dependency` element still being read.
struct Open {
    row: usize,
    found: [bool; 6],
}

/// Collect every `dependency` element, at any depth, in document order.
///
/// Each coordinate is the first text of the first descendant element with
/// that name, so a coordinate missing directly under `dependency` may be
/// filled from a nested element such as an exclusion.
pub fn read_dependencies<R: Read>(reader: R, origin: &Path) -> Result<Vec<Dependency>> {
    let parser = ParserConfig::new()
        .trim_whitespace(true)
        .cdata_to_characters(true)
        .create_reader(reader);

    let mut deps: Vec<Dependency> = Vec::new();
    let mut open: Vec<Open> = Vec::new();
    // Coordinate element just opened and the rows it is the first match for.
    let mut pending: Option<(usize, Vec<usize>)> = None;

    for event in parser {
        let event = event.map_err(|source| Error::Xml {
            path: origin.to_path_buf(),
            source,
        })?;
        match event {
            XmlEvent::StartElement { name, .. } => {
                pending = None;
                if name.local_name == "dependency" {
                    open.push(Open {
                        row: deps.len(),
                        found: [false; 6],
                    });
                    deps.push(Dependency::default());
                } else if let Some(column) = COORDINATES.iter().position(|c| *c == name.local_name)
                {
                    // Claimed by the first occurrence even if it has no text.
                    let rows: Vec<usize> = open
                        .iter_mut()
                        .filter(|o| !o.found[column])
                        .map(|o| {
                            o.found[column] = true;
                            o.row
                        })
                        .collect();
                    if !rows.is_empty() {
                        pending = Some((column, rows));
                    }
                }
            }
            XmlEvent::Characters(text) => {
                if let Some((column, rows)) = pending.take() {
                    for row in rows {
                        deps[row].coordinates[column] = text.clone();
                    }
                }
            }
            XmlEvent::EndElement { name } => {
                pending = None;
                if name.local_name == "dependency" {
                    open.pop();
                }
            }
            _ => {}
        }
    }
    Ok(deps)
}

/// Write the tab-separated report: header, underline, one row per dependency.
pub fn write_report<W: Write>(deps: &[Dependency], writer: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(csv::QuoteStyle::Never)
        .flexible(true)
        .from_writer(writer);
    wtr.write_record(HEADER)?;
    wtr.write_record([UNDERLINE])?;
    for dep in deps {
        wtr.write_record(&dep.coordinates)?;
    }
    wtr.flush()
        .map_err(|e| Error::io("could not write dependency report", e))?;
    Ok(())
}

pub fn report(pom: &Path) -> Result<()> {
    let file = File::open(pom)
        .map_err(|e| Error::io(format!("could not open build descriptor {:?}", pom), e))?;
    let deps = read_dependencies(BufReader::new(file), pom)?;
    write_report(&deps, io::stdout().lock())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_read_fixture_pom() {
        let pom = PathBuf::from("tests/data/pom.xml");
        let deps = read_dependencies(File::open(&pom).unwrap(), &pom).unwrap();
        assert_eq!(deps.len(), 3);
        assert_eq!(deps[0].coordinates[0], "junit");
        assert_eq!(deps[0].coordinates[1], "junit");
        assert_eq!(deps[0].coordinates[2], "4.13.2");
        assert_eq!(deps[0].coordinates[5], "test");
        assert_eq!(deps[1].coordinates[3], "jar");
        assert_eq!(deps[1].coordinates[4], "linux-x86_64");
        assert_eq!(deps[2].coordinates[2], "");
        assert_eq!(deps[2].coordinates[5], "");
    }

    #[test]
    fn test_missing_coordinate_taken_from_descendant() {
        let doc = "<project><dependencies><dependency><artifactId>a</artifactId>\
                   <exclusions><exclusion><groupId>ex.group</groupId></exclusion></exclusions>\
                   </dependency></dependencies></project>";
        let deps = read_dependencies(doc.as_bytes(), Path::new("pom.xml")).unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].coordinates[0], "ex.group");
    }

    #[test]
    fn test_no_dependencies() {
        let deps = read_dependencies("<project/>".as_bytes(), Path::new("pom.xml")).unwrap();
        assert!(deps.is_empty());
    }

    #[test]
    fn test_malformed() {
        let err = read_dependencies("<project><dependency>".as_bytes(), Path::new("pom.xml"));
        assert!(matches!(err, Err(Error::Xml { .. })));
    }

    #[test]
    fn test_write_report() {
        let dep = Dependency {
            coordinates: [
                "g".to_owned(),
                "a".to_owned(),
                "1.0".to_owned(),
                String::new(),
                String::new(),
                "compile".to_owned(),
            ],
        };
        let mut out = Vec::new();
        write_report(&[dep], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Group ID\tArtifact ID\tVersion\tType\tClassifier\tScope");
        assert!(lines[1].starts_with("____"));
        assert_eq!(lines[2], "g\ta\t1.0\t\t\tcompile");
    }
}
