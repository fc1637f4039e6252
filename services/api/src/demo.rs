use std::sync::Arc;

use chrono::Local;
use clap::Args;

use crate::infra::{build_engine, session_config, EngineManager};
use fate_trials::config::TrialRuntimeConfig;
use fate_trials::error::AppError;
use fate_trials::trials::catalog::{UserState, INDUCTION_KEY};
use fate_trials::trials::profile::Dimension;
use fate_trials::trials::session::{SubmitOutcome, TrialOutcome, TrialResult, UserId};

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// RNG seed; the same seed replays the same fates.
    #[arg(long, default_value_t = 42)]
    pub(crate) seed: u64,
    /// How many scripted players to run through the induction rite.
    #[arg(long, default_value_t = 200)]
    pub(crate) cohort: u32,
    /// Skip the cohort run and show only the narrated trial.
    #[arg(long)]
    pub(crate) skip_cohort: bool,
}

const COHORT_CHOICES: [[&str; 2]; 6] = [
    ["A", "A"],
    ["B", "C"],
    ["C", "B"],
    ["D", "D"],
    ["A", "C"],
    ["B", "A"],
];

const COHORT_VOWS: [&str; 4] = [
    "我愿守护苍生",
    "只求问心无愧",
    "想变强，然后回家",
    "I just want to understand the way of things.",
];

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        seed,
        cohort,
        skip_cohort,
    } = args;

    println!("Fate trials demo (seed {seed}, {})", Local::now().format("%Y-%m-%d %H:%M"));

    let manager = build_engine(
        session_config(&TrialRuntimeConfig {
            answer_timeout_secs: 300,
            sweep_interval_secs: 300,
        }),
        Some(seed),
    )?;

    narrated_trial(&manager).await?;

    if skip_cohort {
        return Ok(());
    }

    println!("\nCohort run: {cohort} scripted inductions");
    for i in 0..cohort {
        let player = UserId(format!("seeker-{i}"));
        let choices = COHORT_CHOICES[i as usize % COHORT_CHOICES.len()];
        let vow = COHORT_VOWS[i as usize % COHORT_VOWS.len()];
        run_scripted_trial(&manager, player, &[choices[0], choices[1], vow]).await?;
    }

    let report = manager.population_report().await?;
    println!("\nPopulation after {} allocations", report.total_allocations);
    println!(
        "{:<10} {:<10} {:>9} {:>6} {:>10} {:>10}",
        "attribute", "tier", "allocated", "held", "observed", "target"
    );
    for entry in &report.entries {
        println!(
            "{:<10} {:<10} {:>9} {:>6} {:>9.1}% {:>9.1}%",
            entry.attribute,
            entry.tier.label(),
            entry.allocated,
            entry.held,
            entry.observed_share * 100.0,
            entry.target_share * 100.0
        );
    }
    println!("\nActive sessions at exit: {}", manager.active_sessions());

    Ok(())
}

async fn narrated_trial(manager: &Arc<EngineManager>) -> Result<(), AppError> {
    let player = UserId("demo-initiate".to_string());
    let answers = ["A", "A", "我愿守护苍生"];

    let started = manager.start(player.clone(), INDUCTION_KEY, &UserState::default())?;
    println!("\n{}: {}", started.name, started.description);

    let mut question = started.question;
    for answer in answers {
        println!("\n[{} / {}] {}", question.step, question.total, question.prompt);
        for option in &question.options {
            println!("  {}. {}", option.label, option.text);
        }
        println!("> {answer}");

        match manager.submit_answer(&player, answer).await? {
            SubmitOutcome::Next { question: next } => question = next,
            SubmitOutcome::Completed { result } => {
                render_result(&result);
                return Ok(());
            }
            SubmitOutcome::Terminated { notice } => {
                println!(
                    "Trial terminated: {} ({})",
                    notice.reason.label(),
                    notice.severity.label()
                );
                return Ok(());
            }
        }
    }
    Ok(())
}

async fn run_scripted_trial(
    manager: &Arc<EngineManager>,
    player: UserId,
    answers: &[&str; 3],
) -> Result<(), AppError> {
    manager.start(player.clone(), INDUCTION_KEY, &UserState::default())?;
    for answer in answers {
        manager.submit_answer(&player, answer).await?;
    }
    Ok(())
}

fn render_result(result: &TrialResult) {
    println!("\nTrial complete.");
    match &result.outcome {
        TrialOutcome::Fate { attribute } => {
            println!(
                "Sealed essence: {} ({} tier)",
                attribute.name,
                attribute.tier.label()
            );
        }
        TrialOutcome::Reward {
            band,
            reward,
            match_rate,
        } => {
            println!(
                "Graded {} ({match_rate:.1}% match), reward {reward}",
                band.label()
            );
        }
    }
    println!("Profile:");
    for dimension in Dimension::ordered() {
        println!(
            "  {:<14} {:>5.2}",
            dimension.label(),
            result.profile.get(dimension)
        );
    }
    if let Some(flavor) = &result.flavor {
        println!("\n{flavor}");
    }
}
