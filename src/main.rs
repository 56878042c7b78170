use anyhow::{bail, Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use hairstyle_advisor::ai::{AiController, OperationKind};
use hairstyle_advisor::capability::openai::OpenAiCapability;
use hairstyle_advisor::capability::{
    Capabilities, ImageBlob, LanguageDetector, LanguageModel, Translator,
};
use hairstyle_advisor::catalog;
use hairstyle_advisor::config::Config;
use hairstyle_advisor::error::AiError;
use hairstyle_advisor::i18n::LanguageManager;
use hairstyle_advisor::storage::{
    storage_usage, HistoryRecord, HistoryStore, KeyValueStore, SqliteStore,
};

const USAGE: &str = "usage: hairstyle-advisor <image-path> [hairstyle-id]";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored when variables come from the environment)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hairstyle_advisor=info".parse()?),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let Some(image_path) = args.next() else {
        bail!(USAGE);
    };
    let hairstyle_id = args
        .next()
        .map(|raw| raw.parse::<u32>().context("hairstyle-id must be a number"))
        .transpose()?;

    info!("Starting hairstyle advisor");

    // Load configuration from environment
    let config = Config::from_env()?;

    let store: Arc<dyn KeyValueStore> = Arc::new(
        SqliteStore::connect(&config.database_url)
            .await
            .with_context(|| format!("Failed to open store at {}", config.database_url))?,
    );

    let openai = Arc::new(OpenAiCapability::from_config(&config)?);
    let capabilities = Capabilities::none()
        .with_model(openai.clone() as Arc<dyn LanguageModel>)
        .with_translator(openai.clone() as Arc<dyn Translator>)
        .with_detector(openai as Arc<dyn LanguageDetector>);

    // Step 1: Resolve the UI language
    let languages =
        LanguageManager::with_capabilities(store.clone(), &capabilities, &config.locale);
    match config.preferred_language.as_deref() {
        Some(code) => {
            if let Err(e) = languages.switch_language(code).await {
                warn!("Could not use PREFERRED_LANGUAGE={}: {}", code, e);
            }
        }
        None => {
            languages.initialize().await;
        }
    }
    let t = |key: &str| languages.translate(key, None, &[]);
    info!("UI language: {}", languages.current_language());

    let controller = AiController::from_capabilities(&capabilities, config.recovery_policy())
        .with_language(languages.subscribe());

    // Step 2: Analyze the face
    let image = load_image(Path::new(&image_path)).await?;
    println!("{}", t("analysis.analyzing"));

    let analysis = match controller.run_face_analysis(image).await {
        Ok(analysis) => analysis,
        Err(e) => {
            warn!("Face analysis failed, using sample result: {}", e);
            if matches!(e, AiError::NoFaceDetected(_)) {
                println!("{}", t("analysis.noFace"));
            }
            let options = controller.recovery_options(OperationKind::FaceAnalysis, Instant::now());
            if options.troubleshooting {
                println!("{}", t("recovery.troubleshooting"));
            }
            println!("{}", t("analysis.mockNotice"));
            controller.skip_face_analysis()?
        }
    };

    println!(
        "{}: {} ({}: {})",
        t("analysis.shape"),
        analysis.face_shape,
        t("analysis.confidence"),
        analysis.confidence
    );
    println!(
        "{}",
        languages.translate(
            &format!("faceShape.{}", analysis.face_shape),
            Some(&analysis.description),
            &[]
        )
    );

    // Step 3: Pick a hairstyle
    let hairstyle = match hairstyle_id {
        Some(id) => catalog::find(id).with_context(|| format!("Unknown hairstyle id {}", id))?,
        None => catalog::recommended_for(&analysis.face_shape)
            .into_iter()
            .next()
            .or_else(|| catalog::all().into_iter().next())
            .context("Hairstyle catalog is empty")?,
    };
    info!("Selected hairstyle: {}", hairstyle.name);

    // Step 4: Generate advice
    println!("{}", t("recommender.generating"));
    let advice = match controller.run_advice_generation(&analysis, &hairstyle).await {
        Ok(advice) => advice,
        Err(e) => {
            warn!("Advice generation failed, using sample advice: {}", e);
            println!("{}", t("recommender.mockNotice"));
            controller.skip_advice(&analysis, &hairstyle)?
        }
    };

    println!("\n{}: {}\n", t("recommender.title"), hairstyle.name);
    println!("{}", advice.text);

    // Step 5: Record history
    let history = HistoryStore::new(store.clone());
    let record = HistoryRecord::new(&analysis.face_shape, &hairstyle.name, &advice.text);
    match history.append(record).await {
        Ok(records) => info!("Saved analysis ({} in history)", records.len()),
        Err(e) => warn!("Failed to save history: {}", e),
    }

    match storage_usage(store.as_ref()).await {
        Ok(usage) => {
            let size = usage.megabytes();
            println!(
                "{}",
                languages.translate("storage.usage", None, &[("size", size.as_str())])
            );
        }
        Err(e) => warn!("Failed to measure storage usage: {}", e),
    }

    info!("Done");
    Ok(())
}

async fn load_image(path: &Path) -> Result<ImageBlob> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read image {}", path.display()))?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    let mime_type = match extension.as_deref() {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    };

    Ok(ImageBlob::new(bytes, mime_type))
}
