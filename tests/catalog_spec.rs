use std::io::Write;

use primer::catalog::{seed, Catalog, CatalogError, RawEntry};
use primer::models::{Category, ErrorKind, FeatureEntry, Snippet};
use speculate2::speculate;

fn sample_snippet() -> Snippet {
    Snippet {
        source: "console.log(1);".to_string(),
        expected_output: vec!["1".to_string()],
        may_throw: false,
        fails_with: None,
    }
}

fn sample_entry(id: &str) -> FeatureEntry {
    FeatureEntry {
        id: id.to_string(),
        category: Category::SpreadRest,
        description: "A sample feature".to_string(),
        snippets: vec![sample_snippet()],
    }
}

speculate! {
    before {
        let mut catalog = Catalog::new();
    }

    describe "register" {
        it "stores an entry and finds it by id" {
            catalog.register(sample_entry("demo")).expect("register failed");

            let entry = catalog.get("demo").expect("lookup failed");
            assert_eq!(entry.category, Category::SpreadRest);
            assert_eq!(catalog.len(), 1);
        }

        it "rejects a duplicate id without changing the catalog" {
            catalog.register(sample_entry("demo")).expect("register failed");

            let err = catalog.register(sample_entry("demo")).unwrap_err();
            assert!(matches!(err, CatalogError::DuplicateId(id) if id == "demo"));
            assert_eq!(catalog.len(), 1);
        }

        it "rejects an entry with no snippets" {
            let mut entry = sample_entry("empty");
            entry.snippets.clear();

            let err = catalog.register(entry).unwrap_err();
            assert!(matches!(err, CatalogError::EmptySnippet(_)));
            assert!(catalog.is_empty());
        }

        it "rejects a snippet with no expectation" {
            let mut entry = sample_entry("no-expectation");
            entry.snippets.push(Snippet {
                source: "console.log(2);".to_string(),
                expected_output: vec![],
                may_throw: false,
                fails_with: None,
            });

            let err = catalog.register(entry).unwrap_err();
            assert!(matches!(err, CatalogError::EmptySnippet(_)));
            assert!(catalog.is_empty());
        }

        it "accepts a may_throw snippet without expected output" {
            let mut entry = sample_entry("documented-failure");
            entry.snippets = vec![Snippet {
                source: "missing();".to_string(),
                expected_output: vec![],
                may_throw: true,
                fails_with: Some(ErrorKind::Reference),
            }];

            catalog.register(entry).expect("register failed");
            assert_eq!(catalog.snippet_count(), 1);
        }
    }

    describe "lookup" {
        it "reports a missing id as NotFound" {
            let err = catalog.get("nope").unwrap_err();
            assert!(matches!(err, CatalogError::NotFound(id) if id == "nope"));
        }

        it "lists entries of one category in registration order" {
            catalog.register(sample_entry("first")).expect("register failed");
            catalog.register(sample_entry("second")).expect("register failed");
            let mut other = sample_entry("other");
            other.category = Category::ErrorHandling;
            catalog.register(other).expect("register failed");

            let spread: Vec<&str> = catalog
                .list_by_category(Category::SpreadRest)
                .iter()
                .map(|e| e.id.as_str())
                .collect();
            assert_eq!(spread, vec!["first", "second"]);
            assert!(catalog.list_by_category(Category::TemplateLiteral).is_empty());
        }
    }

    describe "load" {
        it "rejects an unknown category string" {
            let defs = vec![RawEntry {
                id: "weird".to_string(),
                category: "metaprogramming".to_string(),
                description: "not a real area".to_string(),
                snippets: vec![sample_snippet()],
            }];

            let err = Catalog::load(defs).unwrap_err();
            assert!(matches!(err, CatalogError::InvalidCategory(c) if c == "metaprogramming"));
        }

        it "aborts the whole load on one bad entry" {
            let defs = vec![
                RawEntry {
                    id: "good".to_string(),
                    category: "spread-rest".to_string(),
                    description: "fine".to_string(),
                    snippets: vec![sample_snippet()],
                },
                RawEntry {
                    id: "good".to_string(),
                    category: "spread-rest".to_string(),
                    description: "duplicate".to_string(),
                    snippets: vec![sample_snippet()],
                },
            ];

            assert!(Catalog::load(defs).is_err());
        }
    }

    describe "from_file" {
        it "loads a JSON definition file" {
            let mut file = tempfile::NamedTempFile::new().expect("temp file");
            write!(
                file,
                r#"[{{"id":"demo","category":"spread-rest","description":"d",
                    "snippets":[{{"source":"console.log(1);","expected_output":["1"]}}]}}]"#
            )
            .expect("write failed");

            let loaded = Catalog::from_file(file.path()).expect("load failed");
            assert_eq!(loaded.len(), 1);
            assert_eq!(loaded.get("demo").expect("lookup failed").snippets.len(), 1);
        }

        it "surfaces malformed JSON as a parse error" {
            let mut file = tempfile::NamedTempFile::new().expect("temp file");
            write!(file, "not json").expect("write failed");

            let err = Catalog::from_file(file.path()).unwrap_err();
            assert!(matches!(err, CatalogError::Parse(_)));
        }
    }

    describe "seed" {
        it "provides a valid built-in catalog" {
            let seeded = seed();
            assert!(!seeded.is_empty());
            assert!(seeded.snippet_count() >= seeded.len());
        }
    }
}
