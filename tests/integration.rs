use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn nexus_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_nexus"))
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let files_dir = root.join("files");
    fs::create_dir_all(&files_dir).unwrap();
    fs::write(
        files_dir.join("tents.json"),
        r#"[
  {"序号": 1, "产品名称": "Tent A", "价格": 100},
  {"序号": 2, "产品名称": "Tent B", "价格": "¥150", "租赁价格": 30, "工期": "2 days"},
  {"序号": 3, "产品名称": "Folding Chair", "价格": 12}
]"#,
    )
    .unwrap();

    let config_content = format!(
        r#"[storage]
data_dir = "{}/data"

[search]
capacity = 8

[logging]
level = "warn"
"#,
        root.display()
    );

    let config_path = config_dir.join("nexus.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_nexus(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = nexus_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run nexus binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn files(config_path: &Path, name: &str) -> String {
    config_path
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("files")
        .join(name)
        .to_str()
        .unwrap()
        .to_string()
}

fn data_file(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("data/nexus_products.json")
}

fn list_json(config_path: &Path) -> Vec<serde_json::Value> {
    let (stdout, stderr, success) = run_nexus(config_path, &["list", "--json"]);
    assert!(success, "list failed: stdout={}, stderr={}", stdout, stderr);
    serde_json::from_str(&stdout).unwrap()
}

fn write_workbook(path: &Path, rows: &[&[&str]]) {
    let file = fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let opts = zip::write::SimpleFileOptions::default();
    let sheet_rows: String = rows
        .iter()
        .enumerate()
        .map(|(r, cells)| {
            let cells: String = cells
                .iter()
                .enumerate()
                .map(|(c, text)| {
                    let col = (b'A' + c as u8) as char;
                    format!(
                        r#"<c r="{}{}" t="inlineStr"><is><t>{}</t></is></c>"#,
                        col,
                        r + 1,
                        text
                    )
                })
                .collect();
            format!(r#"<row r="{}">{}</row>"#, r + 1, cells)
        })
        .collect();
    zip.start_file("xl/worksheets/sheet1.xml", opts).unwrap();
    zip.write_all(
        format!(
            "<worksheet><sheetData>{}</sheetData></worksheet>",
            sheet_rows
        )
        .as_bytes(),
    )
    .unwrap();
    zip.finish().unwrap();
}

#[test]
fn test_import_json_and_list() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) =
        run_nexus(&config_path, &["import", &files(&config_path, "tents.json")]);
    assert!(success, "import failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Imported 3 products"));

    let products = list_json(&config_path);
    assert_eq!(products.len(), 3);
    assert_eq!(products[0]["id"], 1);
    assert_eq!(products[0]["name"], "Tent A");
    assert_eq!(products[0]["price"], 100);
    assert_eq!(products[0]["rentalPrice"], "");
    assert_eq!(products[1]["leadTime"], "2 days");
    assert!(data_file(&config_path).exists());
}

#[test]
fn test_second_import_is_listed_first() {
    let (tmp, config_path) = setup_test_env();
    let extra = tmp.path().join("files/extra.json");
    fs::write(&extra, r#"[{"Name": "Stage Light", "Price": 80}]"#).unwrap();

    run_nexus(&config_path, &["import", &files(&config_path, "tents.json")]);
    let (_, _, success) = run_nexus(&config_path, &["import", extra.to_str().unwrap()]);
    assert!(success);

    let products = list_json(&config_path);
    let names: Vec<&str> = products
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Stage Light", "Tent A", "Tent B", "Folding Chair"]);
    // Missing id falls back to the 1-based row position.
    assert_eq!(products[0]["id"], 1);
}

#[test]
fn test_import_replace() {
    let (tmp, config_path) = setup_test_env();
    let extra = tmp.path().join("files/extra.json");
    fs::write(&extra, r#"[{"Name": "Stage Light", "Price": 80}]"#).unwrap();

    run_nexus(&config_path, &["import", &files(&config_path, "tents.json")]);
    let (stdout, _, success) = run_nexus(
        &config_path,
        &["import", extra.to_str().unwrap(), "--replace"],
    );
    assert!(success);
    assert!(stdout.contains("Loaded 1 products"));
    assert_eq!(list_json(&config_path).len(), 1);
}

#[test]
fn test_import_dry_run_does_not_write() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_nexus(
        &config_path,
        &["import", &files(&config_path, "tents.json"), "--dry-run"],
    );
    assert!(success);
    assert!(stdout.contains("dry-run"));
    assert!(stdout.contains("products:             3"));
    assert!(!data_file(&config_path).exists());
}

#[test]
fn test_import_workbook() {
    let (tmp, config_path) = setup_test_env();
    let book = tmp.path().join("files/prices.xlsx");
    write_workbook(
        &book,
        &[
            &["序号", "产品名称", "价格", "注意事项"],
            &["A-7", "LED Screen", "500", "Handle with care"],
            &["A-8", "Speaker", "", ""],
        ],
    );

    let (stdout, stderr, success) = run_nexus(&config_path, &["import", book.to_str().unwrap()]);
    assert!(success, "import failed: stdout={}, stderr={}", stdout, stderr);

    let products = list_json(&config_path);
    assert_eq!(products.len(), 2);
    assert_eq!(products[0]["id"], "A-7");
    assert_eq!(products[0]["notes"], "Handle with care");
    assert_eq!(products[1]["name"], "Speaker");
    assert_eq!(products[1]["price"], "N/A");
}

#[test]
fn test_import_unsupported_format() {
    let (tmp, config_path) = setup_test_env();
    let notes = tmp.path().join("files/notes.txt");
    fs::write(&notes, "hello").unwrap();

    let (_, stderr, success) = run_nexus(&config_path, &["import", notes.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("unsupported file format"));
}

#[test]
fn test_search_by_name_and_id() {
    let (_tmp, config_path) = setup_test_env();
    run_nexus(&config_path, &["import", &files(&config_path, "tents.json")]);

    let (stdout, stderr, success) = run_nexus(&config_path, &["search", "tent", "--json"]);
    assert!(success, "search failed: stdout={}, stderr={}", stdout, stderr);
    let results: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    let names: Vec<&str> = results
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Tent A", "Tent B"]);

    let (stdout, _, _) = run_nexus(&config_path, &["search", "3", "--json"]);
    let results: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["name"], "Folding Chair");
}

#[test]
fn test_search_no_results() {
    let (_tmp, config_path) = setup_test_env();
    run_nexus(&config_path, &["import", &files(&config_path, "tents.json")]);

    let (stdout, _, success) = run_nexus(&config_path, &["search", "xyzzy"]);
    assert!(success);
    assert!(stdout.contains("No results."));
}

#[test]
fn test_search_is_capped() {
    let (tmp, config_path) = setup_test_env();
    let many = tmp.path().join("files/many.json");
    let rows: Vec<serde_json::Value> = (1..=12)
        .map(|i| serde_json::json!({"ID": i, "Name": format!("Lamp {}", i), "Price": 5}))
        .collect();
    fs::write(&many, serde_json::to_string(&rows).unwrap()).unwrap();
    run_nexus(&config_path, &["import", many.to_str().unwrap()]);

    let (stdout, _, _) = run_nexus(&config_path, &["search", "lamp", "--json"]);
    let results: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    assert_eq!(results.len(), 8);
    assert_eq!(results[0]["name"], "Lamp 1");

    let (stdout, _, _) = run_nexus(&config_path, &["search", "lamp", "--limit", "3", "--json"]);
    let results: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    assert_eq!(results.len(), 3);
}

#[test]
fn test_show_product_detail() {
    let (_tmp, config_path) = setup_test_env();
    run_nexus(&config_path, &["import", &files(&config_path, "tents.json")]);

    let (stdout, stderr, success) = run_nexus(&config_path, &["show", "1"]);
    assert!(success, "show failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Tent A"));
    assert!(stdout.contains("rental price:  N/A"));

    let (stdout, _, _) = run_nexus(&config_path, &["show", "2"]);
    assert!(stdout.contains("rental price:  30"));
    assert!(stdout.contains("2 days"));
}

#[test]
fn test_show_missing_product() {
    let (_tmp, config_path) = setup_test_env();

    let (_, stderr, success) = run_nexus(&config_path, &["show", "404"]);
    assert!(!success);
    assert!(stderr.contains("product not found"));
}

#[test]
fn test_add_persists_across_runs() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_nexus(
        &config_path,
        &["add", "--id", "P-1", "--name", "Projector", "--price", "300"],
    );
    assert!(success, "add failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Added product P-1"));

    let products = list_json(&config_path);
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["id"], "P-1");
    assert_eq!(products[0]["price"], "300");
}

#[test]
fn test_add_without_price_is_rejected() {
    let (_tmp, config_path) = setup_test_env();

    let (_, stderr, success) = run_nexus(&config_path, &["add", "--name", "Projector"]);
    assert!(!success);
    assert!(stderr.contains("price"));
    assert!(!data_file(&config_path).exists());
}

#[test]
fn test_add_default_id_is_six_digits() {
    let (_tmp, config_path) = setup_test_env();

    run_nexus(&config_path, &["add", "--name", "Mic", "--price", "20"]);
    let products = list_json(&config_path);
    let id = products[0]["id"].as_str().unwrap();
    assert_eq!(id.len(), 6);
    assert!(id.chars().all(|c| c.is_ascii_digit()));
}

#[test]
fn test_edit_in_place() {
    let (_tmp, config_path) = setup_test_env();
    run_nexus(&config_path, &["import", &files(&config_path, "tents.json")]);

    let (stdout, stderr, success) = run_nexus(
        &config_path,
        &["edit", "2", "--price", "¥180", "--notes", "New canvas"],
    );
    assert!(success, "edit failed: stdout={}, stderr={}", stdout, stderr);

    let products = list_json(&config_path);
    assert_eq!(products.len(), 3);
    assert_eq!(products[1]["name"], "Tent B");
    assert_eq!(products[1]["price"], "¥180");
    assert_eq!(products[1]["notes"], "New canvas");
    // Untouched numeric id stays numeric.
    assert_eq!(products[1]["id"], 2);
}

#[test]
fn test_remove_deletes_all_duplicates() {
    let (tmp, config_path) = setup_test_env();
    let dups = tmp.path().join("files/dups.json");
    fs::write(
        &dups,
        r#"[{"ID": 7, "Name": "Cable"}, {"ID": "7", "Name": "Cable copy"}, {"ID": 8, "Name": "Plug"}]"#,
    )
    .unwrap();
    run_nexus(&config_path, &["import", dups.to_str().unwrap()]);

    let (stdout, _, success) = run_nexus(&config_path, &["remove", "7"]);
    assert!(success);
    assert!(stdout.contains("Removed 2 products with id 7."));

    let products = list_json(&config_path);
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["name"], "Plug");

    let (stdout, _, success) = run_nexus(&config_path, &["remove", "7"]);
    assert!(success);
    assert!(stdout.contains("No product with id 7."));
}

#[test]
fn test_corrupt_store_starts_empty() {
    let (_tmp, config_path) = setup_test_env();
    let path = data_file(&config_path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "{ this is not json").unwrap();

    let (stdout, stderr, success) = run_nexus(&config_path, &["list"]);
    assert!(success, "list failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Catalog is empty."));
    assert!(stderr.contains("corrupt"));
}

#[test]
fn test_export_to_file() {
    let (tmp, config_path) = setup_test_env();
    run_nexus(&config_path, &["import", &files(&config_path, "tents.json")]);

    let out = tmp.path().join("out/catalog.json");
    let (_, stderr, success) = run_nexus(&config_path, &["export", "--output", out.to_str().unwrap()]);
    assert!(success);
    assert!(stderr.contains("Exported 3 products"));

    let exported: Vec<serde_json::Value> =
        serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(exported.len(), 3);
    assert_eq!(exported[1]["rentalPrice"], 30);
}

#[test]
fn test_stats() {
    let (_tmp, config_path) = setup_test_env();
    run_nexus(&config_path, &["import", &files(&config_path, "tents.json")]);

    let (stdout, _, success) = run_nexus(&config_path, &["stats"]);
    assert!(success);
    assert!(stdout.contains("Products:    3"));
    assert!(stdout.contains("Store key:   nexus_products"));
    assert!(stdout.contains("nexus_products.json"));
}

#[test]
fn test_missing_config_uses_defaults() {
    let tmp = TempDir::new().unwrap();
    let output = Command::new(nexus_binary())
        .current_dir(tmp.path())
        .args(["add", "--id", "1", "--name", "Tent A", "--price", "100"])
        .env_remove("RUST_LOG")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(tmp.path().join("data/nexus_products.json").exists());
}

#[test]
fn test_invalid_config_is_rejected() {
    let (_tmp, config_path) = setup_test_env();
    fs::write(&config_path, "[search]\ncapacity = 0\n").unwrap();

    let (_, stderr, success) = run_nexus(&config_path, &["list"]);
    assert!(!success);
    assert!(stderr.contains("search.capacity"));
}

#[test]
fn test_tent_lifecycle() {
    let (tmp, config_path) = setup_test_env();
    let tent = tmp.path().join("files/tent.json");
    fs::write(&tent, r#"[{"产品名称": "Tent A", "价格": "100"}]"#).unwrap();

    let (_, _, success) = run_nexus(&config_path, &["import", tent.to_str().unwrap()]);
    assert!(success);
    let products = list_json(&config_path);
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["id"], 1);
    assert_eq!(products[0]["name"], "Tent A");
    assert_eq!(products[0]["price"], "100");
    assert_eq!(products[0]["notes"], "");

    let (stdout, _, _) = run_nexus(&config_path, &["search", "tent", "--json"]);
    let results: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["name"], "Tent A");
    assert_eq!(results[0]["rentalPrice"], "");

    let (_, _, success) = run_nexus(&config_path, &["edit", "1", "--price", "120"]);
    assert!(success);
    let products = list_json(&config_path);
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["price"], "120");
    assert_eq!(products[0]["id"], 1);

    let (stdout, _, success) = run_nexus(&config_path, &["remove", "1"]);
    assert!(success);
    assert!(stdout.contains("Removed 1 product with id 1."));
    assert!(list_json(&config_path).is_empty());

    let (stdout, _, success) = run_nexus(&config_path, &["search", "tent", "--json"]);
    assert!(success);
    let results: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    assert!(results.is_empty());
}
