use super::*;
use rustc_hash::FxHashMap;

struct MapLoader(FxHashMap<&'static str, &'static str>);

impl IncludeLoader for MapLoader {
    fn load(&self, _including_file: &str, target: &str) -> Option<LoadedInclude> {
        self.0.get(target).map(|text| LoadedInclude {
            path: Arc::from(target),
            text: Arc::from(*text),
        })
    }
}

fn loader(files: &[(&'static str, &'static str)]) -> MapLoader {
    MapLoader(files.iter().copied().collect())
}

#[test]
fn test_include_splices_tokens_with_shifted_offsets() {
    let main = "var a;\ninclude \"inc.as\";\nvar b;";
    let files = loader(&[("inc.as", "var x;\n")]);
    let result = tokenize(Arc::from("main.as"), Arc::from(main), Some(&files));

    assert!(result.problems.is_empty(), "{:?}", result.problems);
    let texts: Vec<&str> = result.tokens.iter().map(|t| t.text()).collect();
    assert_eq!(
        texts,
        vec!["var", "a", ";", "var", "x", ";", "var", "b", ";", "end of file"]
    );

    // `x` comes from inc.as
    let x = &result.tokens[4];
    assert_eq!((x.start, x.end), (28, 29));
    assert_eq!(result.lookup.local_offset(x.start), Some(("inc.as", 4)));

    // `b` is shifted past the 7 included characters
    let b = &result.tokens[7];
    assert_eq!(b.start, 36);
    assert_eq!(result.lookup.local_offset(b.start), Some(("main.as", 29)));

    let eof = result.tokens.last().unwrap();
    assert_eq!(eof.start, (main.len() + 7) as u32);
    assert_eq!(result.included_files, vec![Arc::<str>::from("inc.as")]);
}

#[test]
fn test_missing_include_reports_problem_and_continues() {
    let result = tokenize(
        Arc::from("main.as"),
        Arc::from("include 'nope.as'\nvar a;"),
        None,
    );
    assert_eq!(result.problems.len(), 1);
    assert_eq!(result.problems[0].code, problem_codes::INCLUDE_NOT_FOUND);
    assert_eq!(result.tokens[0].text(), "var");
}

#[test]
fn test_include_cycle_is_detected() {
    let files = loader(&[("a.as", "include 'b.as';"), ("b.as", "include 'a.as'; var z;")]);
    let result = tokenize(Arc::from("a.as"), Arc::from("include 'b.as';"), Some(&files));
    assert_eq!(result.problems.len(), 1);
    assert_eq!(result.problems[0].code, problem_codes::INCLUDE_CYCLE);
    let texts: Vec<&str> = result.tokens.iter().map(|t| t.text()).collect();
    assert_eq!(texts, vec!["var", "z", ";", "end of file"]);
}

#[test]
fn test_nested_includes_are_recorded_once() {
    let files = loader(&[("b.as", "include 'c.as'; var b;"), ("c.as", "var c;")]);
    let result = tokenize(
        Arc::from("a.as"),
        Arc::from("include 'b.as'; include 'c.as';"),
        Some(&files),
    );
    assert!(result.problems.is_empty());
    let names: Vec<&str> = result.included_files.iter().map(|f| &**f).collect();
    assert_eq!(names, vec!["b.as", "c.as"]);
    assert_eq!(result.lookup.files().len(), 3);
}
