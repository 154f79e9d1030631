//! End-to-end runs of the `heatmap` binary

use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const INPUT: &str = r#"{
    "values": [[4.0, 0.0, 1.0], [null, 2.0, 8.0], [5.0, 1.0, 0.5]],
    "row_labels": [
        {"label": "Escherichia coli", "sort_key": 561, "genus_name": "Escherichia"},
        {"label": "Klebsiella pneumoniae", "sort_key": 570, "genus_name": "Klebsiella"},
        {"label": "Escherichia albertii", "sort_key": 561, "genus_name": "Escherichia"}
    ],
    "column_labels": [
        {"id": 11, "label": "Patient A", "metadata": {"sample_type": "Blood"}},
        {"id": 12, "label": "Patient B", "metadata": {"sample_type": "CSF"}},
        {"id": 13, "label": "Patient C", "pinned": true}
    ]
}"#;

fn heatmap() -> Command {
    Command::new(env!("CARGO_BIN_EXE_heatmap"))
}

fn write_input(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("input.json");
    std::fs::write(&path, INPUT).unwrap();
    path
}

#[test]
fn test_render_svg_is_deterministic_without_footer() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path());
    let config = dir.path().join("heatmap.toml");
    std::fs::write(&config, "[export]\nfooter = false\n").unwrap();

    let mut outputs = Vec::new();
    for name in ["a.svg", "b.svg"] {
        let out = dir.path().join(name);
        let status = heatmap()
            .args(["--quiet", "--config"])
            .arg(&config)
            .args(["render", "--sort-rows", "--sort-columns", "--input"])
            .arg(&input)
            .arg("--out")
            .arg(&out)
            .status()
            .unwrap();
        assert!(status.success());
        outputs.push(std::fs::read(out).unwrap());
    }
    assert_eq!(outputs[0], outputs[1]);
}

#[test]
fn test_render_png_by_extension() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path());
    let out = dir.path().join("plot.png");

    let status = heatmap()
        .args(["-q", "render", "--scale", "symlog", "--input"])
        .arg(&input)
        .arg("--out")
        .arg(&out)
        .status()
        .unwrap();

    assert!(status.success());
    let bytes = std::fs::read(out).unwrap();
    assert_eq!(&bytes[1..4], b"PNG");
}

#[test]
fn test_csv_to_stdout() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path());

    let output = heatmap()
        .args(["-q", "csv", "--header", "Taxon", "--header", "Genus", "--input"])
        .arg(&input)
        .output()
        .unwrap();

    assert!(output.status.success());
    let csv = String::from_utf8(output.stdout).unwrap();
    let mut lines = csv.lines();
    let header = lines.next().unwrap();
    assert!(header.starts_with("Taxon,Genus,"));
    assert_eq!(lines.count(), 3);
    assert!(csv.contains("Klebsiella pneumoniae,Klebsiella,"));
}

#[test]
fn test_missing_input_reports_suggestions() {
    let dir = TempDir::new().unwrap();
    let output = heatmap()
        .args(["-q", "render", "--input"])
        .arg(dir.path().join("missing.json"))
        .arg("--out")
        .arg(dir.path().join("out.svg"))
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("File not found"));
    assert!(stderr.contains("Suggestions:"));
}

#[test]
fn test_config_prints_example() {
    let output = heatmap().arg("config").output().unwrap();
    assert!(output.status.success());
    let toml = String::from_utf8(output.stdout).unwrap();
    assert!(toml.contains("[heatmap]"));
    assert!(toml.contains("min_cell_width"));
}

#[test]
fn test_render_help_describes_sort_flags() {
    let output = heatmap().args(["render", "--help"]).output().unwrap();
    assert!(output.status.success());
    let help = String::from_utf8(output.stdout).unwrap();
    assert!(help.contains("Sort rows alphabetically instead of clustering them"));
    assert!(help.contains("Sort columns alphabetically instead of clustering them"));
}
