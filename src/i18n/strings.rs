/// Canonical English UI strings.
///
/// Every other language's table is derived from this list, key for key.
/// Placeholders use `{name}` and must survive translation.
pub const ENGLISH_STRINGS: &[(&str, &str)] = &[
    // ==================== Common ====================
    ("common.loading", "Loading..."),
    ("common.error", "An error occurred"),
    ("common.tryAgain", "Try Again"),
    ("common.save", "Save"),
    ("common.cancel", "Cancel"),
    ("common.privacy", "Data Never Leaves Device"),
    ("common.offline", "Offline Available"),
    ("common.poweredBy", "Powered by {technology}"),
    ("common.translating", "Translating to"),
    // ==================== Navigation ====================
    ("nav.home", "Home"),
    ("nav.analyze", "Analyze"),
    ("nav.gallery", "Gallery"),
    ("nav.results", "Results"),
    ("navigation.back", "Back"),
    ("navigation.next", "Next"),
    ("navigation.restart", "Restart"),
    ("navigation.steps.camera", "Take Photo"),
    ("navigation.steps.analysis", "AI Analysis"),
    ("navigation.steps.selection", "Browse Styles"),
    ("navigation.steps.results", "Get Advice"),
    ("step.camera.description", "Upload or take photo"),
    ("step.analysis.description", "AI analyzes face shape"),
    ("step.selection.description", "Browse hairstyles"),
    ("step.results.description", "Get recommendations"),
    // ==================== Camera ====================
    ("camera.title", "Step 1: Upload Photo"),
    (
        "camera.subtitle",
        "Take or upload a clear front-facing photo for AI face analysis",
    ),
    ("camera.takePhoto", "Take Photo"),
    ("camera.uploadPhoto", "Upload Photo"),
    ("camera.useThisPhoto", "Use This Photo"),
    ("camera.retake", "Retake"),
    ("camera.tips", "Photo Tips"),
    ("camera.tip1", "Choose a well-lit environment"),
    ("camera.tip2", "Face the camera directly, keep face clear"),
    ("camera.tip3", "Avoid wearing hats or sunglasses"),
    ("camera.tip4", "Maintain natural expression"),
    ("camera.captureError", "Photo capture failed: "),
    ("camera.processingError", "Image processing failed: "),
    ("camera.starting", "Starting camera..."),
    ("camera.cameraNotReady", "Camera not ready"),
    // ==================== Analysis ====================
    ("analysis.analyzing", "AI is analyzing facial features..."),
    ("analysis.detecting", "Detecting facial features"),
    ("analysis.shape", "Face Shape"),
    ("analysis.features", "Features"),
    ("analysis.confidence", "Confidence"),
    ("analysis.failed", "Face analysis failed"),
    ("analysis.complete", "Analysis complete"),
    ("analysis.usingTech", "Using {technology} technology"),
    ("analysis.noFace", "No face detected. Please retake the photo."),
    ("analysis.mockNotice", "On-device AI unavailable, showing sample results"),
    // ==================== Recommender ====================
    ("recommender.title", "AI Hairstyle Recommendation"),
    ("recommender.generating", "AI is generating personalized advice..."),
    ("recommender.generationFailed", "Generation Failed"),
    ("recommender.regenerate", "Regenerate Recommendation"),
    ("recommender.ready", "Ready to Generate Advice"),
    (
        "recommender.basedOn",
        "Based on your {faceShape} face shape and selected {hairstyle}",
    ),
    ("recommender.generate", "Generate AI Advice"),
    ("recommender.about", "About AI Recommendations"),
    (
        "recommender.feature1",
        "Personalized advice based on face shape and hairstyle features",
    ),
    (
        "recommender.feature2",
        "Includes daily care, styling, and precautions",
    ),
    (
        "recommender.feature3",
        "Consult a professional stylist for final decisions",
    ),
    ("recommender.sections.reason", "Why It Suits You"),
    ("recommender.sections.maintenance", "Maintenance Tips"),
    ("recommender.sections.styling", "Styling Suggestions"),
    ("recommender.sections.caution", "Things to Note"),
    (
        "recommender.missingInfo",
        "Missing necessary information, please ensure you have selected a hairstyle",
    ),
    (
        "recommender.generationError",
        "Error generating recommendation, please try again",
    ),
    ("recommender.mockNotice", "Sample advice, not generated by AI"),
    // ==================== Recovery ====================
    ("recovery.retry", "Retry (attempt {count})"),
    ("recovery.skip", "Skip and use sample data"),
    (
        "recovery.troubleshooting",
        "The on-device AI could not complete this step",
    ),
    ("recovery.cancelled", "Cancelled"),
    // ==================== Gallery ====================
    ("gallery.title", "Step 3: Choose Your Favorite Hairstyle"),
    (
        "gallery.subtitle",
        "Based on your {faceShape} face shape, these hairstyles are recommended for you. AI analyzes facial features to suggest the most flattering styles.",
    ),
    ("gallery.recommended", "Recommended"),
    ("gallery.all", "All"),
    ("gallery.search", "Search hairstyle names, types..."),
    ("gallery.filterByTag", "Filter by tag:"),
    ("gallery.filterByDifficulty", "Filter by difficulty:"),
    ("gallery.difficulty.easy", "Easy"),
    ("gallery.difficulty.medium", "Medium"),
    ("gallery.difficulty.hard", "Hard"),
    ("gallery.noResults", "No matching hairstyles found"),
    ("gallery.tryAdjusting", "Try adjusting search or filter conditions"),
    ("gallery.showingResults", "Showing {count} of {total} hairstyles"),
    ("gallery.tagsSelected", "tags selected"),
    // ==================== Face Shapes ====================
    (
        "faceShape.Oval",
        "Standard face shape, suitable for almost all hairstyles",
    ),
    (
        "faceShape.Round",
        "Face length and width are similar, need to elongate face shape through hairstyle",
    ),
    (
        "faceShape.Square",
        "Obvious jaw angle, need to soften contours through hairstyle",
    ),
    (
        "faceShape.Heart",
        "Wider forehead, sharper chin, need to balance upper and lower proportions",
    ),
    (
        "faceShape.Long",
        "Face length is significantly greater than face width, need to increase width through hairstyle",
    ),
    // ==================== Results ====================
    ("results.title", "Step 4: Your Personalized Hairstyle Recommendation"),
    (
        "results.subtitle",
        "Personalized hairstyle plan generated based on AI analysis",
    ),
    // ==================== Language ====================
    ("language.current", "Current Language"),
    ("language.autoDetect", "Auto Detect"),
    ("language.autoDetecting", "Detecting language..."),
    ("language.select", "Select language"),
    ("language.apiUnavailable", "API Unavailable"),
    (
        "language.fallbackNotice",
        "Translation unavailable, showing English",
    ),
    // ==================== App ====================
    ("app.title", "AI Hairstyle Advisor"),
    (
        "app.subtitle",
        "Using Built-in AI · Privacy Protection · Offline Available",
    ),
    // ==================== Storage ====================
    ("storage.export", "Export History"),
    ("storage.import", "Import History"),
    ("storage.clear", "Clear History"),
    ("storage.usage", "Storage Usage: {size} MB"),
];
