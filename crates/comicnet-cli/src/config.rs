//! Command-line and environment configuration.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Default request body limit: 16 MiB.
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Parser)]
#[command(name = "comicnet", version, about = "Image classification over HTTP")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve `POST /classify`.
    Serve(ServeArgs),
    /// Classify a local image file and print the ranked labels.
    Classify(ClassifyArgs),
    /// Send an image to a running server.
    Query(QueryArgs),
}

/// Where to find the model and its labels.
#[derive(Debug, Clone, Args)]
pub struct ModelArgs {
    /// ONNX model file with an NHWC image input.
    #[arg(long, env = "COMICNET_MODEL", default_value = "./comic_net.onnx")]
    pub model: PathBuf,

    /// Labels file, one class per line.
    #[arg(long, env = "COMICNET_LABELS", default_value = "./comic_net.labels")]
    pub labels: PathBuf,

    /// Intra-op threads for the runtime (runtime default when unset).
    #[arg(long, env = "COMICNET_THREADS")]
    pub threads: Option<usize>,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    #[arg(long, env = "COMICNET_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "COMICNET_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Largest accepted request body.
    #[arg(long, env = "COMICNET_MAX_BODY_BYTES", default_value_t = DEFAULT_MAX_BODY_BYTES)]
    pub max_body_bytes: usize,
}

impl ServeArgs {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Args)]
pub struct ClassifyArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// How many ranked labels to print.
    #[arg(long, default_value_t = 1)]
    pub top: usize,

    pub image: PathBuf,
}

#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Server base URL.
    #[arg(long, env = "COMICNET_URL", default_value = "http://127.0.0.1:5000")]
    pub url: String,

    /// Fail unless the server's top label is this one.
    #[arg(long)]
    pub expect: Option<String>,

    pub image: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_defaults() {
        let cli = Cli::try_parse_from(["comicnet", "serve"]).unwrap();
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.bind_addr(), "0.0.0.0:5000");
        assert_eq!(args.model.model, PathBuf::from("./comic_net.onnx"));
        assert_eq!(args.model.labels, PathBuf::from("./comic_net.labels"));
        assert_eq!(args.model.threads, None);
        assert_eq!(args.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
    }

    #[test]
    fn serve_overrides() {
        let cli = Cli::try_parse_from([
            "comicnet",
            "serve",
            "--model",
            "/models/net.onnx",
            "--labels",
            "/models/net.labels",
            "--threads",
            "2",
            "--host",
            "127.0.0.1",
            "--port",
            "8080",
        ])
        .unwrap();
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.bind_addr(), "127.0.0.1:8080");
        assert_eq!(args.model.threads, Some(2));
        assert_eq!(args.model.model, PathBuf::from("/models/net.onnx"));
    }

    #[test]
    fn classify_takes_image_and_top() {
        let cli = Cli::try_parse_from(["comicnet", "classify", "--top", "5", "strip.png"]).unwrap();
        let Command::Classify(args) = cli.command else {
            panic!("expected classify");
        };
        assert_eq!(args.top, 5);
        assert_eq!(args.image, PathBuf::from("strip.png"));
    }

    #[test]
    fn query_expect_label() {
        let cli = Cli::try_parse_from([
            "comicnet",
            "query",
            "--url",
            "http://classifier:5000",
            "--expect",
            "comic",
            "a.jpg",
        ])
        .unwrap();
        let Command::Query(args) = cli.command else {
            panic!("expected query");
        };
        assert_eq!(args.url, "http://classifier:5000");
        assert_eq!(args.expect.as_deref(), Some("comic"));
    }

    #[test]
    fn classify_requires_image() {
        assert!(Cli::try_parse_from(["comicnet", "classify"]).is_err());
    }

    #[test]
    fn bad_port_rejected() {
        assert!(Cli::try_parse_from(["comicnet", "serve", "--port", "99999"]).is_err());
    }
}
