mod config;
mod display;
mod server;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use comicnet_ai::{Classifier, OnnxModel};
use comicnet_client::ClassifierClient;
use comicnet_core::LabelTable;

use config::{Cli, ClassifyArgs, Command, ModelArgs, QueryArgs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    tracing::info!("comicnet v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Serve(args) => {
            let classifier = load_classifier(&args.model)?;
            server::serve(Arc::new(classifier), &args).await
        }
        Command::Classify(args) => classify_file(&args),
        Command::Query(args) => query(&args).await,
    }
}

/// Load the model and labels; any failure here aborts startup.
fn load_classifier(args: &ModelArgs) -> anyhow::Result<Classifier> {
    let model = OnnxModel::load(&args.model, args.threads)
        .with_context(|| format!("loading model {}", args.model.display()))?;
    let labels = LabelTable::load(&args.labels).context("loading labels")?;
    Classifier::new(Box::new(model), labels).context("preparing classifier")
}

fn classify_file(args: &ClassifyArgs) -> anyhow::Result<()> {
    let classifier = load_classifier(&args.model)?;
    eprint!("{}", display::format_model(&classifier));

    let bytes = std::fs::read(&args.image)
        .with_context(|| format!("reading {}", args.image.display()))?;
    let ranked = classifier
        .classify_top_k(&bytes, args.top)
        .with_context(|| format!("classifying {}", args.image.display()))?;
    print!("{}", display::format_ranking(&ranked));
    Ok(())
}

async fn query(args: &QueryArgs) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(&args.image)
        .await
        .with_context(|| format!("reading {}", args.image.display()))?;
    let client = ClassifierClient::new(args.url.clone());

    if let Some(expected) = &args.expect {
        let matched = client
            .is_label(bytes, expected)
            .await
            .with_context(|| format!("querying {}", client.endpoint()))?;
        anyhow::ensure!(matched, "top label is not {expected:?}");
        println!("{expected}");
        return Ok(());
    }

    let result = client
        .classify(bytes)
        .await
        .with_context(|| format!("querying {}", client.endpoint()))?;
    print!("{}", display::format_ranking(std::slice::from_ref(&result)));
    Ok(())
}
