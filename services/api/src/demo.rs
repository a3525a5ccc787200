use crate::infra::{build_services, configured_store, open_store, Services};
use branch_review::config::AppConfig;
use branch_review::error::AppError;
use branch_review::workflows::reviews::ranking::views::{BranchCard, RankingTableView};
use branch_review::workflows::reviews::{
    read_branch_roster, AnswerInput, BranchDraft, DashboardView, ItemType, Lane, QuestionDraft,
    RankingCarousels, RankingConfig, ReviewServiceError, ReviewSubmission, SurveyDraft,
};
use chrono::{Local, NaiveDate};
use clap::Args;
use std::path::PathBuf;

const DEMO_SURVEY: &str = "Service Quality";

#[derive(Args, Debug)]
pub(crate) struct RankArgs {
    /// JSON document file to read reviews from (defaults to APP_DATA_PATH)
    #[arg(long)]
    pub(crate) data: Option<PathBuf>,
    /// Print the dashboard payload as JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct BranchImportArgs {
    /// Roster CSV with Name, Manager, Contact and Address columns
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// JSON document file to import into (defaults to APP_DATA_PATH)
    #[arg(long)]
    pub(crate) data: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Review date for the seeded reviews (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) date: Option<NaiveDate>,
    /// Override the outstanding threshold used for the demo ranking (1-5)
    #[arg(long, value_parser = crate::infra::parse_threshold)]
    pub(crate) threshold: Option<f64>,
}

fn services_for(data: Option<PathBuf>) -> Result<Services, AppError> {
    let config = AppConfig::load()?;
    let store = match data {
        Some(path) => open_store(Some(path.as_path())),
        None => configured_store(&config.storage),
    };
    Ok(build_services(store, config.ranking))
}

pub(crate) fn run_rank(args: RankArgs) -> Result<(), AppError> {
    let services = services_for(args.data)?;
    let dashboard = services.reviews.dashboard()?;

    if args.json {
        match serde_json::to_string_pretty(&dashboard) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("Dashboard payload unavailable: {err}"),
        }
        return Ok(());
    }

    render_dashboard(&dashboard);
    Ok(())
}

pub(crate) fn run_branch_import(args: BranchImportArgs) -> Result<(), AppError> {
    let drafts = read_branch_roster(&args.csv)?;
    let services = services_for(args.data)?;
    let summary = services.catalog.import_branches(drafts)?;

    println!(
        "Imported {} branches from {}",
        summary.created,
        args.csv.display()
    );
    if !summary.skipped.is_empty() {
        println!("Skipped (name missing or already on the roster):");
        for name in &summary.skipped {
            println!("  - {name}");
        }
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let date = args
        .date
        .unwrap_or_else(|| Local::now().date_naive())
        .format("%Y-%m-%d")
        .to_string();
    let mut ranking = RankingConfig::default();
    if let Some(threshold) = args.threshold {
        ranking.outstanding_threshold = threshold;
    }

    let services = build_services(open_store(None), ranking.clone());
    seed_catalog(&services)?;

    println!("Branch review demo ({DEMO_SURVEY}, threshold {:.1})", ranking.outstanding_threshold);
    for (branch, scores, status) in [
        ("Haifa Center", [5, 4, 3], "ok"),
        ("Haifa Center", [2, 2, 2], "partial"),
        ("Eilat Port", [4, 5, 5], "ok"),
        ("Acre", [2, 1, 2], "not-ok"),
        ("Beersheba", [3, 2, 3], "partial"),
    ] {
        let record = services
            .reviews
            .submit(demo_submission(branch, &date, scores, status))?;
        println!(
            "- Saved review {} for {} -> {} / {} answered, average {}",
            record.id.0,
            record.branch,
            record.summary.answered_questions,
            record.summary.total_questions,
            record.average_label()
        );
    }

    let mut incomplete = demo_submission("Acre", &date, [3, 3, 3], "ok");
    incomplete.answers.retain(|answer| answer.question_index != 5);
    incomplete.reviewer.clear();
    match services.reviews.submit(incomplete) {
        Err(ReviewServiceError::Validation(err)) => {
            println!("- Rejected an incomplete review:");
            for violation in &err.violations {
                println!("    * {violation}");
            }
        }
        Err(err) => return Err(err.into()),
        Ok(record) => println!("- Unexpectedly saved {}", record.id.0),
    }

    let dashboard = services.reviews.dashboard()?;
    println!();
    render_dashboard(&dashboard);

    let mut carousels = RankingCarousels::new(ranking.rotation_interval());
    carousels.refresh(&services.reviews.rankings()?);
    println!("\nFeatured rotation (every {}s):", ranking.rotation_interval_secs);
    for _ in 0..3 {
        let view = carousels.featured();
        println!(
            "  outstanding: {} | needs improvement: {}",
            featured_label(view.outstanding.as_ref().map(|featured| &featured.card)),
            featured_label(view.needs_improvement.as_ref().map(|featured| &featured.card)),
        );
        carousels.tick(ranking.rotation_interval());
    }
    println!(
        "  (outstanding lane at position {:?})",
        carousels.cursor(Lane::Outstanding).index().map(|index| index + 1)
    );

    Ok(())
}

fn seed_catalog(services: &Services) -> Result<(), ReviewServiceError> {
    let survey = services.catalog.create_survey(SurveyDraft {
        name: DEMO_SURVEY.to_string(),
        description: "Counter service walk-through".to_string(),
    })?;

    let questions = [
        ("Counter", ItemType::GroupTitle, "Service"),
        ("Greeting and courtesy", ItemType::Rating, "Service"),
        ("Wait time", ItemType::Rating, "Service"),
        ("Product knowledge", ItemType::Rating, "Staff"),
        ("Register area tidy", ItemType::Status, "Hygiene"),
        ("Notes on signage", ItemType::FreeText, "Hygiene"),
    ];
    for (text, item_type, topic) in questions {
        services.catalog.add_question(
            &survey.id,
            QuestionDraft {
                item_name: String::new(),
                item_type,
                question_text: text.to_string(),
                topic: topic.to_string(),
                subtopic: None,
            },
        )?;
    }

    for (name, manager) in [
        ("Haifa Center", "Dana Levi"),
        ("Eilat Port", "Yossi Peretz"),
        ("Acre", ""),
    ] {
        services.catalog.create_branch(BranchDraft {
            name: name.to_string(),
            manager: manager.to_string(),
            ..BranchDraft::default()
        })?;
    }
    Ok(())
}

fn demo_submission(branch: &str, date: &str, scores: [u8; 3], status: &str) -> ReviewSubmission {
    let mut answers: Vec<AnswerInput> = scores
        .iter()
        .enumerate()
        .map(|(offset, score)| AnswerInput {
            question_index: offset + 1,
            rating: Some(*score),
            ..AnswerInput::default()
        })
        .collect();
    answers.push(AnswerInput {
        question_index: 4,
        status: Some(status.to_string()),
        ..AnswerInput::default()
    });
    answers.push(AnswerInput {
        question_index: 5,
        text: Some("Opening hours sign faded".to_string()),
        rating: scores.iter().min().copied(),
        status: None,
    });

    ReviewSubmission {
        branch: branch.to_string(),
        survey: DEMO_SURVEY.to_string(),
        reviewer: "Noa Cohen".to_string(),
        date: date.to_string(),
        answers,
        ..ReviewSubmission::default()
    }
}

fn featured_label(card: Option<&BranchCard>) -> String {
    card.map(|card| format!("{} ({})", card.name, card.average_label))
        .unwrap_or_else(|| "-".to_string())
}

fn render_dashboard(dashboard: &DashboardView) {
    println!(
        "Branch ranking ({} reviews, outstanding at >= {:.1})",
        dashboard.total_reviews, dashboard.threshold
    );

    let rows = match &dashboard.table {
        RankingTableView::NoData { message } => {
            println!("  {message}");
            return;
        }
        RankingTableView::Ranked { rows } => rows,
    };

    for row in rows {
        println!(
            "  {:>2}. {:<20} {:>4}  {} review(s)  manager: {}{}",
            row.rank,
            row.card.name,
            row.card.average_label,
            row.card.review_count,
            row.card.manager,
            if row.outstanding { "  *" } else { "" }
        );
    }

    println!("Outstanding:");
    print_cards(&dashboard.outstanding);
    println!("Needs improvement:");
    print_cards(&dashboard.needs_improvement);
}

fn print_cards(cards: &[BranchCard]) {
    if cards.is_empty() {
        println!("  none");
        return;
    }
    for card in cards {
        println!(
            "  - {} {} (contact: {})",
            card.name, card.average_label, card.contact
        );
    }
}
