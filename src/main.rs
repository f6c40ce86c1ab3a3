//! Command-line front end for the translation coordinator.
//!
//! Usage:
//!   translation-coordinator translate <lang> <text>...  # Translate each text into <lang>
//!   translation-coordinator detect <text>               # Detect the language of <text>
//!   translation-coordinator languages                   # List supported display languages
//!
//! Required environment variables (translate, detect):
//! - TRANSLATE_API_KEY
//!
//! Optional:
//! - TRANSLATE_API_URL, TRANSLATE_DETECT_URL
//! - TRANSLATE_TIMEOUT_SECS (defaults to 10)
//! - TRANSLATE_MAX_ATTEMPTS (defaults to 3)
//! - TRANSLATION_CACHE_CAPACITY (defaults to 10000)
//! - PREFERENCES_PATH (defaults to .translation-preferences.json)

use anyhow::{bail, Result};
use tracing::info;
use translation_coordinator::{Config, Language, TranslationService};

const USAGE: &str = "usage: translation-coordinator <translate <lang> <text>... | detect <text> | languages>";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("translation_coordinator=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        bail!(USAGE);
    };

    match command.as_str() {
        "languages" => {
            for language in Language::all() {
                let marker = if language.is_canonical() { " (default)" } else { "" };
                println!(
                    "{}  {} / {}{}",
                    language.code(),
                    language.name(),
                    language.native_name(),
                    marker
                );
            }
            Ok(())
        }
        "translate" => {
            let Some((code, texts)) = rest.split_first() else {
                bail!(USAGE);
            };
            if texts.is_empty() {
                bail!(USAGE);
            }
            let target = Language::from_code(code)?;

            let config = Config::from_env()?;
            let service = TranslationService::from_config(&config)?;
            let coordinator = service.coordinator();

            info!("Translating {} string(s) into {}", texts.len(), target.name());
            let translated = if texts.len() == 1 {
                vec![coordinator.translate_to(&texts[0], target).await]
            } else {
                coordinator.translate_batch_to(texts, target).await
            };
            for line in translated {
                println!("{}", line);
            }

            service.shutdown();
            Ok(())
        }
        "detect" => {
            if rest.is_empty() {
                bail!(USAGE);
            }
            let text = rest.join(" ");

            let config = Config::from_env()?;
            let service = TranslationService::from_config(&config)?;

            match service.detector().detect_now(&text).await {
                Some(code) => println!("{}", code),
                None => println!("unknown"),
            }

            service.shutdown();
            Ok(())
        }
        other => bail!("unknown command '{}'\n{}", other, USAGE),
    }
}
