use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use trajscope_core::{Completion, EpisodeReport, ProgressSource, SessionReport};

fn completion_label(completion: Completion) -> String {
    match completion {
        Completion::Complete => "true".to_string(),
        Completion::Incomplete => "false".to_string(),
        Completion::Undetermined(reason) => format!("undetermined: {reason}"),
    }
}

fn level_options_label(options: &[i64]) -> String {
    let joined = options
        .iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    format!("[{joined}]")
}

fn session_title(report: &SessionReport) -> String {
    report.started_at.map_or_else(
        || report.dir.display().to_string(),
        |started| format!("{} (started {started})", report.dir.display()),
    )
}

pub fn generate_console_report(
    out: &mut dyn Write,
    reports: &[SessionReport],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Session Outcomes".bright_cyan().bold())?;
    writeln!(out, "{}", "===================".cyan())?;

    let episodes: usize = reports.iter().map(|r| r.episodes.len()).sum();
    writeln!(out, "Sessions: {}", reports.len())?;
    writeln!(out, "Episodes: {episodes}")?;
    writeln!(out, "Analysis time: {total_duration:?}")?;
    writeln!(out)?;

    for report in reports {
        writeln!(out, "{}", session_title(report).bold())?;
        for episode in &report.episodes {
            write_console_episode(out, report, episode)?;
        }

        let tally = report.tally();
        writeln!(
            out,
            "   Complete: {}  Incomplete: {}  Undetermined: {}  Total reward: {}",
            tally.complete.to_string().green(),
            tally.incomplete.to_string().red(),
            tally.undetermined.to_string().yellow(),
            tally.total_reward
        )?;
        writeln!(out)?;
    }

    Ok(())
}

fn write_console_episode(
    out: &mut dyn Write,
    report: &SessionReport,
    episode: &EpisodeReport,
) -> Result<()> {
    let outcome = &episode.outcome;
    writeln!(out, "{}", episode.path.display())?;
    if let Some(env_name) = &report.info.env_name {
        writeln!(out, " - Env name: {env_name}")?;
    }
    writeln!(out, " - Level seed: {}", outcome.level_seed)?;
    if let Some(options) = &report.info.level_options {
        writeln!(out, " - Level options: {}", level_options_label(options))?;
    }
    writeln!(out, " - Episode length: {}", outcome.episode_length)?;
    writeln!(out, " - Episode reward: {}", outcome.episode_reward)?;

    let label = completion_label(outcome.level_complete);
    let colored_label = match outcome.level_complete {
        Completion::Complete => label.green(),
        Completion::Incomplete => label.red(),
        Completion::Undetermined(_) => label.yellow(),
    };
    writeln!(out, " - Level complete: {colored_label}")?;
    writeln!(
        out,
        " - Level progress at episode end: {}",
        outcome.level_progress_at_end
    )?;
    writeln!(
        out,
        " - Max achieved level progress: {}",
        outcome.level_progress_max
    )?;
    writeln!(out)?;
    Ok(())
}

pub fn generate_json_report(out: &mut dyn Write, reports: &[SessionReport]) -> Result<()> {
    let json_output = serde_json::to_string_pretty(reports)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report(out: &mut dyn Write, reports: &[SessionReport]) -> Result<()> {
    writeln!(out, "# Trajectory Session Outcomes\n")?;

    for report in reports {
        let tally = report.tally();
        writeln!(out, "## {}\n", session_title(report))?;
        if let Some(env_name) = &report.info.env_name {
            writeln!(out, "- **Env name**: {env_name}")?;
        }
        if let Some(options) = &report.info.level_options {
            writeln!(out, "- **Level options**: {}", level_options_label(options))?;
        }
        writeln!(out, "- **Episodes**: {}", report.episodes.len())?;
        writeln!(
            out,
            "- **Complete / incomplete / undetermined**: {} / {} / {}",
            tally.complete, tally.incomplete, tally.undetermined
        )?;
        writeln!(out, "- **Total reward**: {}\n", tally.total_reward)?;

        writeln!(
            out,
            "| Episode | Seed | Length | Reward | Complete | Progress at end | Max progress |"
        )?;
        writeln!(out, "|---|---|---|---|---|---|---|")?;
        for episode in &report.episodes {
            let outcome = &episode.outcome;
            let name = episode
                .path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            writeln!(
                out,
                "| {name} | {} | {} | {} | {} | {} | {} |",
                outcome.level_seed,
                outcome.episode_length,
                outcome.episode_reward,
                completion_label(outcome.level_complete),
                outcome.level_progress_at_end,
                outcome.level_progress_max
            )?;
        }
        writeln!(out)?;
    }

    Ok(())
}

const CSV_HEADER: &str = "session_dir,session_started_at,path,env_name,level_options,level_seed,episode_length,episode_reward,level_complete,undetermined_reason,level_progress_at_end,level_progress_max,progress_source,progress_saturated";

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// One row per episode, in session then play order.
pub fn generate_csv_report(out: &mut dyn Write, reports: &[SessionReport]) -> Result<()> {
    writeln!(out, "{CSV_HEADER}")?;
    for report in reports {
        let dir = report.dir.display().to_string();
        let started = report
            .started_at
            .map(|ts| ts.format("%Y-%m-%dT%H:%M:%S").to_string())
            .unwrap_or_default();
        let env_name = report.info.env_name.clone().unwrap_or_default();
        let options = report
            .info
            .level_options
            .as_deref()
            .map(level_options_label)
            .unwrap_or_default();

        for episode in &report.episodes {
            let outcome = &episode.outcome;
            let (complete, reason) = match outcome.level_complete {
                Completion::Complete => ("true".to_string(), String::new()),
                Completion::Incomplete => ("false".to_string(), String::new()),
                Completion::Undetermined(reason) => ("undetermined".to_string(), reason.to_string()),
            };
            let source = match outcome.progress_source {
                ProgressSource::Successor => "successor",
                ProgressSource::FinalStep => "final_step",
            };
            writeln!(
                out,
                "{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
                csv_field(&dir),
                started,
                csv_field(&episode.path.display().to_string()),
                csv_field(&env_name),
                csv_field(&options),
                outcome.level_seed,
                outcome.episode_length,
                outcome.episode_reward,
                complete,
                csv_field(&reason),
                outcome.level_progress_at_end,
                outcome.level_progress_max,
                source,
                outcome.progress_saturated
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use trajscope_core::{
        EpisodeOutcome, SessionInfo, UndeterminedReason, parse_session_timestamp,
    };

    fn outcome(level_complete: Completion, progress: f64) -> EpisodeOutcome {
        EpisodeOutcome {
            episode_length: 3,
            episode_reward: 12.0,
            level_seed: 77,
            level_complete,
            level_progress_at_end: progress,
            level_progress_max: progress,
            progress_source: ProgressSource::FinalStep,
            progress_saturated: false,
        }
    }

    fn sample_report() -> SessionReport {
        SessionReport {
            dir: PathBuf::from("/runs/2021-01-01-00-00-00"),
            started_at: parse_session_timestamp("2021-01-01-00-00-00"),
            info: SessionInfo {
                env_name: Some("heist".to_string()),
                level_options: Some(vec![1, 0]),
            },
            episodes: vec![
                EpisodeReport {
                    path: PathBuf::from("/runs/2021-01-01-00-00-00/h_000000000.json"),
                    outcome: outcome(Completion::Complete, 100.0),
                },
                EpisodeReport {
                    path: PathBuf::from("/runs/2021-01-01-00-00-00/h_000000001.json"),
                    outcome: outcome(
                        Completion::Undetermined(UndeterminedReason::NoThreshold),
                        42.0,
                    ),
                },
            ],
        }
    }

    fn render(f: impl FnOnce(&mut dyn Write) -> Result<()>) -> String {
        let mut buffer = Vec::new();
        f(&mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn console_report_lists_fields_and_marks_undetermined() {
        colored::control::set_override(false);
        let reports = [sample_report()];
        let text = render(|out| generate_console_report(out, &reports, Duration::ZERO));
        assert!(text.contains("h_000000000.json"));
        assert!(text.contains(" - Env name: heist"));
        assert!(text.contains(" - Level options: [1 0]"));
        assert!(text.contains(" - Level complete: true"));
        assert!(text.contains(
            " - Level complete: undetermined: determine by reward (env reward threshold not implemented)"
        ));
        assert!(text.contains(" - Max achieved level progress: 42"));
    }

    #[test]
    fn csv_report_has_one_row_per_episode() {
        let reports = [sample_report()];
        let text = render(|out| generate_csv_report(out, &reports));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER);
        assert!(lines[1].contains(",true,,100,100,final_step,false"));
        assert!(lines[2].contains(",undetermined,"));
        assert!(lines[2].contains("2021-01-01T00:00:00"));
    }

    #[test]
    fn csv_fields_are_escaped() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn markdown_report_includes_tally() {
        let reports = [sample_report()];
        let text = render(|out| generate_markdown_report(out, &reports));
        assert!(text.starts_with("# Trajectory Session Outcomes"));
        assert!(text.contains("**Complete / incomplete / undetermined**: 1 / 0 / 1"));
        assert!(text.contains("| h_000000001.json | 77 | 3 | 12 | undetermined"));
    }

    #[test]
    fn json_report_keeps_structured_completion() {
        let reports = [sample_report()];
        let text = render(|out| generate_json_report(out, &reports));
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        let status = &parsed[0]["episodes"][1]["outcome"]["level_complete"];
        assert_eq!(status["status"], "undetermined");
        assert_eq!(status["reason"], "no_threshold");
    }
}
