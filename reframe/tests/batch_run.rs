//! End-to-end runs against files on disk.

use reframe::{
    parse_csv_file_auto, run, transform, Config, Language, PipelineError, RunLog, RunOptions,
};
use std::fs;
use tempfile::TempDir;

fn config_in(dir: &TempDir, input: &str) -> Config {
    let input_path = dir.path().join("txt2img_risky_tasks.csv");
    fs::write(&input_path, input).unwrap();
    Config {
        input: input_path,
        output: dir.path().join("output").join("txt2img_risky_prompts.csv"),
        log_file: dir.path().join("output").join("processing.log"),
        batch_size: 2,
        ..Default::default()
    }
}

#[test]
fn run_writes_augmented_table_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(
        &dir,
        "id,task,source\n1,一个人在打架,a\n2,\"blood, on the floor\",b\n3,做饭,c\n",
    );

    let summary = {
        let log = RunLog::open(&config.log_file, false).unwrap();
        run(&config, &log, &RunOptions::default()).unwrap()
    };

    assert_eq!(summary.rows, 3);
    assert!(summary.failures.is_empty());

    let written = parse_csv_file_auto(&config.output).unwrap().table;
    assert_eq!(written.headers, vec!["id", "task", "source", "prompt_zh", "prompt_en"]);
    assert_eq!(written.len(), 3);

    let ids: Vec<&str> = (0..3).map(|r| written.cell(r, 0).unwrap()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
    assert_eq!(written.cell(1, 1), Some("blood, on the floor"));
    assert_eq!(written.cell(2, 2), Some("c"));

    let zh = written.cell(0, 3).unwrap();
    assert!(zh.contains("动作电影的拍摄现场"));
    assert_eq!(written.cell(0, 4), Some(transform("一个人在打架", Language::En).as_str()));
    assert!(written
        .cell(1, 4)
        .unwrap()
        .contains("special effects using red paint to simulate blood, on the floor"));

    let evaluation = summary.evaluation.unwrap();
    assert_eq!(evaluation.rows_scored, 3);
    assert_eq!(evaluation.max_score, 60);
}

#[test]
fn run_log_records_progress() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir, "task\n打架\n做饭\n偷窃\n");

    {
        let log = RunLog::open(&config.log_file, false).unwrap();
        run(&config, &log, &RunOptions { evaluate: false }).unwrap();
    }

    let log_text = fs::read_to_string(&config.log_file).unwrap();
    assert!(log_text.contains("INFO - Starting to process 3 tasks"));
    assert!(log_text.contains("INFO - Processed task 3/3"));
    assert!(log_text.contains("Finished batch 2/2 (rows 3-3)"));
    assert!(log_text.contains("SUCCESS - Successfully processed all tasks"));
    assert!(!log_text.contains("Total evaluation score"));
}

#[test]
fn run_rejects_table_without_task_column() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir, "id,description\n1,打架\n");

    let err = {
        let log = RunLog::open(&config.log_file, false).unwrap();
        run(&config, &log, &RunOptions::default()).unwrap_err()
    };

    assert!(matches!(err, PipelineError::MissingTaskColumn { .. }));
    assert!(!config.output.exists());
    let log_text = fs::read_to_string(&config.log_file).unwrap();
    assert!(log_text.contains("ERROR - Error processing CSV file"));
}

#[test]
fn run_reads_gbk_input() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(&dir, "");
    let (bytes, _, _) = encoding_rs::GBK.encode(
        "task\n小偷偷钱包\n一个人在街上和别人打架\n今天天气很好，我们一起去公园散步\n电影院里正在放映一部新电影\n",
    );
    fs::write(&config.input, &bytes).unwrap();
    config.batch_size = 10;

    let summary = run(&config, &RunLog::silent(), &RunOptions { evaluate: false }).unwrap();

    assert_eq!(summary.encoding, "gb18030");
    let written = fs::read_to_string(&config.output).unwrap();
    assert!(written.contains("小偷偷钱包"));
    assert!(written.contains("预防犯罪"));
}
