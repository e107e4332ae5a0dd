use ocr_table_worker::extract::{
    BELOW_DETECTION_SENTINEL, Cascade, ClusterParams, ExtractError, ExtractOptions, OcrOutput,
    Strategy, Table, ValueScope, WarningCode, Word, extract_positional, extract_table,
    normalize_table_values, parse_delimited, parse_whitespace_runs, tesseract,
    validate_geochemical_value,
};
use pretty_assertions::assert_eq;

fn strings(cells: &[&str]) -> Vec<String> {
    cells.iter().map(ToString::to_string).collect()
}

#[test]
fn delimited_rows_survive_a_round_trip() {
    let rows = vec![
        strings(&["Sample", "SiO2", "MgO"]),
        strings(&["A-1", "48.2", "7.1"]),
        strings(&["A-2", "51.0", "6.4"]),
    ];
    let lines = rows.iter().map(|row| row.join(" | ")).collect::<Vec<_>>();

    let table = parse_delimited(&lines, '|').expect("pipe table");
    assert_eq!(table.headers, rows[0]);
    assert_eq!(table.rows, rows[1..].to_vec());
}

#[test]
fn whitespace_runs_use_the_widest_line() {
    let lines = strings(&[
        "Sample  SiO2  MgO  CaO",
        "A-1  48.2  7.1",
        "A-2  51.0  6.4  9.9",
    ]);
    let table = parse_whitespace_runs(&lines).expect("table");
    assert_eq!(table.width(), 4);
    assert!(table.is_rectangular());
    assert_eq!(table.rows[0], strings(&["A-1", "48.2", "7.1", ""]));
}

#[test]
fn below_detection_spellings_collapse_to_sentinel() {
    for raw in ["bd", "BD", "-", " bd ", "<bd"] {
        assert_eq!(validate_geochemical_value(raw), BELOW_DETECTION_SENTINEL, "{raw:?}");
    }
    assert_eq!(validate_geochemical_value("O12.5S"), "012.55");
    assert_eq!(validate_geochemical_value("quartz vein"), "quartz vein");
}

#[test]
fn value_cleanup_is_idempotent() {
    let table = Table::new(
        strings(&["Sample", "SiO2", "Fe2O3"]),
        vec![
            strings(&["SO-1", "4S,2", "bd"]),
            strings(&["SO-2", "O.5", "-"]),
        ],
    );
    let once = normalize_table_values(table, ValueScope::AllButFirst);
    let twice = normalize_table_values(once.clone(), ValueScope::AllButFirst);
    assert_eq!(once, twice);
    assert_eq!(once.rows[0], strings(&["SO-1", "45.2", "<0.01"]));
    assert_eq!(once.rows[1], strings(&["SO-2", "0.5", "<0.01"]));
}

#[test]
fn positional_scenario_rebuilds_grid() {
    let words = vec![
        Word::at("A", 0.0, 0.0, 90.0),
        Word::at("B", 100.0, 0.0, 90.0),
        Word::at("1", 2.0, 20.0, 90.0),
        Word::at("2", 98.0, 20.0, 90.0),
    ];
    let (table, warnings) = extract_positional("A B\n1 2", &words, &ClusterParams::default());
    assert_eq!(table.headers, strings(&["A", "B"]));
    assert_eq!(table.rows, vec![strings(&["1", "2"])]);
    assert!(warnings.is_empty());
}

#[test]
fn unalignable_word_is_left_out() {
    let words = vec![
        Word::at("Sample", 0.0, 0.0, 90.0),
        Word::at("SiO2", 100.0, 0.0, 90.0),
        Word::at("A-1", 0.0, 20.0, 90.0),
        Word::at("smudge", 25.0, 20.0, 90.0),
        Word::at("48.2", 100.0, 20.0, 90.0),
    ];
    let params = ClusterParams {
        max_align_distance: 20.0,
        ..ClusterParams::default()
    };
    let (table, warnings) = extract_positional("", &words, &params);
    assert_eq!(table.rows, vec![strings(&["A-1", "48.2"])]);
    assert!(
        warnings
            .iter()
            .any(|warning| warning.code == WarningCode::UnalignableToken)
    );
}

#[test]
fn single_line_is_insufficient() {
    let err = extract_table(
        &OcrOutput::text_only("\n  Sample\tSiO2  \n\n"),
        &ExtractOptions::default(),
    )
    .expect_err("one line");
    assert!(matches!(err, ExtractError::InsufficientInput { lines: 1 }));
}

#[test]
fn tab_beats_comma_in_tab_first_cascade() {
    let input = OcrOutput::text_only("Sample\tSiO2,MgO\nA-1\t48,2\n");
    let options = ExtractOptions {
        cascade: Some(Cascade::tab_first()),
        ..ExtractOptions::default()
    };
    let extraction = extract_table(&input, &options).expect("table");
    assert_eq!(extraction.report.strategy, Some(Strategy::Tab));
    assert_eq!(extraction.table.headers, strings(&["Sample", "SiO2,MgO"]));
}

#[test]
fn spacing_keeps_comparison_with_its_value() {
    let input = OcrOutput::text_only("Sample  SiO2  MgO\nA-1  48.2  <  0.01\n");
    let options = ExtractOptions {
        cascade: Some("spacing".parse().expect("cascade")),
        ..ExtractOptions::default()
    };
    let extraction = extract_table(&input, &options).expect("table");
    assert_eq!(extraction.report.strategy, Some(Strategy::Spacing));
    assert_eq!(extraction.table.rows, vec![strings(&["A-1", "48.2", "<0.01"])]);
}

#[test]
fn spaces_first_cascade_uses_data_fallback_header() {
    let input = OcrOutput::text_only("handwritten note\nno table here\n");
    let options = ExtractOptions {
        cascade: Some(Cascade::spaces_first()),
        ..ExtractOptions::default()
    };
    let extraction = extract_table(&input, &options).expect("fallback");
    assert_eq!(extraction.report.strategy, None);
    assert_eq!(extraction.table.headers, strings(&["Data"]));
    assert_eq!(extraction.table.rows.len(), 2);
}

#[test]
fn tesseract_words_feed_the_clusterer() {
    let tsv = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext\n\
               5\t1\t1\t1\t1\t1\t10\t10\t60\t20\t95\tSample\n\
               5\t1\t1\t1\t1\t2\t140\t11\t40\t20\t93\tCaO\n\
               5\t1\t1\t1\t1\t3\t300\t12\t20\t20\t12\t~\n\
               5\t1\t1\t1\t2\t1\t11\t42\t40\t20\t90\tSO-1\n\
               5\t1\t1\t1\t2\t2\t142\t41\t40\t20\t88\tl2,O\n";
    let input = tesseract::parse_tsv(tsv);
    assert!(input.has_geometry());

    let extraction = extract_table(&input, &ExtractOptions::default()).expect("table");
    assert_eq!(extraction.report.strategy, Some(Strategy::Positional));
    assert_eq!(extraction.table.headers, strings(&["Sample", "CaO"]));
    assert_eq!(extraction.table.rows, vec![strings(&["SO-1", "12.0"])]);
    assert_eq!(
        extraction.report.warnings[0].code,
        WarningCode::LowConfidenceWords
    );
}

#[test]
fn edits_keep_tables_rectangular() {
    let table = Table::new(strings(&["Sample", "SiO2"]), vec![strings(&["A-1", "48.2"])]);

    let table = table.insert_column(1, "  ").expect("insert column");
    assert_eq!(table.headers, strings(&["Sample", "New Column", "SiO2"]));

    let table = table
        .push_empty_row()
        .insert_row(0, strings(&["A-0"]))
        .expect("insert row")
        .replace_cell(2, 2, "50.1")
        .expect("replace cell");
    assert!(table.is_rectangular());
    assert_eq!(table.rows[0], strings(&["A-0", "", ""]));
    assert_eq!(table.rows[2], strings(&["", "", "50.1"]));

    let table = table.remove_column(1).expect("remove column");
    assert_eq!(table.width(), 2);
    assert!(table.is_rectangular());

    let err = table.remove_row(9).expect_err("out of range");
    assert_eq!(err.to_string(), "row index 9 is out of range (len=3)");
}
