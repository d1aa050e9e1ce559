use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::path::Path;
use std::process::Command;

fn write_bed(path: &Path, rows: &[(&str, u64)]) {
    let mut f = std::fs::File::create(path).expect("create bed");
    for (chrom, start) in rows {
        writeln!(f, "{}\t{}\t{}\t80.0\t10", chrom, start, start + 1).expect("write bed");
    }
}

fn ten_chr1_rows() -> Vec<(&'static str, u64)> {
    (0..10).map(|i| ("chr1", i * 1000)).collect()
}

#[test]
fn single_chromosome_writes_window_csv() {
    let temp = assert_fs::TempDir::new().unwrap();
    let bed = temp.path().join("sites.bed");
    write_bed(&bed, &ten_chr1_rows());
    let out = temp.path().join("results");

    let mut cmd = Command::cargo_bin("density_analyzer").expect("binary exists");
    cmd.arg(&bed)
        .arg("--window-size").arg("5000")
        .arg("--output").arg(&out)
        .arg("--no-plots")
        .arg("--save-data");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Chromosome: chr1"))
        .stdout(predicate::str::contains("Created 2 windows"))
        .stdout(predicate::str::contains("Mean density: 1.00 CpGs/kb"));

    let csv = out.join("1_density_5kb.csv");
    assert!(csv.exists(), "density csv missing");
    let contents = std::fs::read_to_string(&csv).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines[0], "chr,window_start,window_end,window_center,cpg_count,density_per_kb");
    assert_eq!(lines.len(), 3);
    assert!(!out.join("1_cpg_density_5kb.png").exists(), "plot written despite --no-plots");
}

#[test]
fn multiple_chromosomes_skip_window_analysis() {
    let temp = assert_fs::TempDir::new().unwrap();
    let bed = temp.path().join("sites.bed");
    write_bed(&bed, &[("chr2", 10), ("chr1", 20), ("chr2", 30)]);

    let mut cmd = Command::cargo_bin("density_analyzer").expect("binary exists");
    cmd.arg(&bed)
        .arg("--output").arg(temp.path())
        .arg("--no-plots")
        .arg("--save-data");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("CpGs per chromosome:"))
        .stdout(predicate::str::contains("chr2: 2"))
        .stdout(predicate::str::contains("Skipping window analysis"));

    let csvs = std::fs::read_dir(temp.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|x| x == "csv"))
        .count();
    assert_eq!(csvs, 0);
}

#[test]
fn chromosome_filter_accepts_short_names() {
    let temp = assert_fs::TempDir::new().unwrap();
    let bed = temp.path().join("sites.bed.gz");
    {
        let file = std::fs::File::create(&bed).unwrap();
        let mut gz = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        for (chrom, start) in [("chr22", 100u64), ("chr1", 150), ("chr22", 2100), ("chr22", 2200)] {
            writeln!(gz, "{}\t{}\t{}", chrom, start, start + 1).unwrap();
        }
        gz.finish().unwrap();
    }

    let run = |chrom: &str, out: &Path| {
        Command::cargo_bin("density_analyzer")
            .expect("binary exists")
            .arg(&bed)
            .arg("-c").arg(chrom)
            .arg("-w").arg("1000")
            .arg("-o").arg(out)
            .arg("--no-plots")
            .arg("--save-data")
            .assert()
            .success()
            .stdout(predicate::str::contains("Filtered to chr22: 3 CpG sites"));
        std::fs::read_to_string(out.join("22_density_1kb.csv")).unwrap()
    };

    let short = run("22", &temp.path().join("short"));
    let long = run("chr22", &temp.path().join("long"));
    assert_eq!(short, long);
}

#[test]
fn missing_input_fails_without_outputs() {
    let temp = assert_fs::TempDir::new().unwrap();
    let out = temp.path().join("never_created");

    let mut cmd = Command::cargo_bin("density_analyzer").expect("binary exists");
    cmd.arg(temp.path().join("missing.bed"))
        .arg("--output").arg(&out)
        .arg("--save-data");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
    assert!(!out.exists());
}

#[test]
fn empty_filter_result_fails() {
    let temp = assert_fs::TempDir::new().unwrap();
    let bed = temp.path().join("sites.bed");
    write_bed(&bed, &ten_chr1_rows());

    let mut cmd = Command::cargo_bin("density_analyzer").expect("binary exists");
    cmd.arg(&bed)
        .arg("--chromosome").arg("7")
        .arg("--output").arg(temp.path())
        .arg("--no-plots");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("No data found for chromosome chr7"));
}

#[test]
fn zero_window_size_is_rejected() {
    let temp = assert_fs::TempDir::new().unwrap();
    let bed = temp.path().join("sites.bed");
    write_bed(&bed, &ten_chr1_rows());

    let mut cmd = Command::cargo_bin("density_analyzer").expect("binary exists");
    cmd.arg(&bed).arg("--window-size").arg("0");
    cmd.assert().failure();
}

#[test]
fn multiple_chromosomes_render_distribution_plot() {
    let temp = assert_fs::TempDir::new().unwrap();
    let bed = temp.path().join("sites.bed");
    write_bed(&bed, &[("chr2", 10), ("chr1", 20), ("chr2", 30)]);

    let mut cmd = Command::cargo_bin("density_analyzer").expect("binary exists");
    cmd.arg(&bed).arg("--output").arg(temp.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Skipping window analysis"));
    assert!(temp.path().join("cpg_per_chromosome.png").exists());
}

#[test]
fn single_chromosome_renders_density_profile() {
    let temp = assert_fs::TempDir::new().unwrap();
    let bed = temp.path().join("sites.bed");
    write_bed(&bed, &ten_chr1_rows());

    let mut cmd = Command::cargo_bin("density_analyzer").expect("binary exists");
    cmd.arg(&bed)
        .arg("--window-size").arg("5000")
        .arg("--output").arg(temp.path());

    cmd.assert().success();
    assert!(temp.path().join("1_cpg_density_5kb.png").exists());
    assert!(!temp.path().join("cpg_per_chromosome.png").exists());
}

#[test]
fn zero_length_span_writes_no_window_outputs() {
    let temp = assert_fs::TempDir::new().unwrap();
    let bed = temp.path().join("sites.bed");
    std::fs::write(&bed, "chr3\t500\t500\n").unwrap();

    let mut cmd = Command::cargo_bin("density_analyzer").expect("binary exists");
    cmd.arg(&bed)
        .arg("--window-size").arg("1000")
        .arg("--output").arg(temp.path())
        .arg("--save-data");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Created 0 windows"));
    assert!(!temp.path().join("3_cpg_density_1kb.png").exists());
    assert!(!temp.path().join("3_density_1kb.csv").exists());
}

#[test]
fn numeric_chromosome_names_load() {
    let temp = assert_fs::TempDir::new().unwrap();
    let bed = temp.path().join("ensembl.bed");
    let rows = (0..150u64)
        .map(|i| ("1", i * 100))
        .chain((0..3u64).map(|i| ("X", i * 100)))
        .collect::<Vec<_>>();
    write_bed(&bed, &rows);

    let mut cmd = Command::cargo_bin("density_analyzer").expect("binary exists");
    cmd.arg(&bed).arg("--output").arg(temp.path()).arg("--no-plots");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Total CpG sites: 153"))
        .stdout(predicate::str::contains("X: 3"));
}
