//! Tests for reading and querying the optimizer configuration.

use ampopt_optimizer::amp::CACHE_HOST;
use ampopt_optimizer::{Configuration, OptimizerError, TransformerConfiguration, TransformerKind};
use serde_json::json;

// ========== defaults ==========

#[test]
fn test_default_runs_every_transformer_in_pipeline_order() {
    let configuration = Configuration::default();
    assert_eq!(
        configuration.transformers,
        vec![
            TransformerKind::AmpBoilerplate,
            TransformerKind::PreloadHeroImage,
            TransformerKind::RewriteAmpUrls,
            TransformerKind::AmpRuntimeCss,
            TransformerKind::ReorderHead,
        ]
    );
    assert!(configuration.preload_hero_image.preload_hero_image);
    assert!(configuration.rewrite_amp_urls.esm_modules_enabled);
    assert_eq!(configuration.rewrite_amp_urls.amp_url_prefix, CACHE_HOST);
}

#[test]
fn test_empty_object_is_the_default() {
    assert_eq!(Configuration::from_json_str("{}").unwrap(), Configuration::default());
}

// ========== reading JSON ==========

#[test]
fn test_partial_sections_keep_other_defaults() {
    let configuration = Configuration::from_json_str(
        r#"{
            "transformers": ["ReorderHead", "AmpBoilerplate"],
            "rewriteAmpUrls": { "ampUrlPrefix": "https://example.com/amp", "lts": true },
            "ampRuntimeCss": { "canary": true }
        }"#,
    )
    .unwrap();

    assert_eq!(
        configuration.transformers,
        vec![TransformerKind::ReorderHead, TransformerKind::AmpBoilerplate]
    );
    assert_eq!(configuration.rewrite_amp_urls.amp_url_prefix, "https://example.com/amp");
    assert!(configuration.rewrite_amp_urls.lts);
    assert!(configuration.rewrite_amp_urls.esm_modules_enabled);
    assert!(configuration.amp_runtime_css.canary);
    assert!(configuration.amp_runtime_css.version.is_empty());
}

#[test]
fn test_from_json_value() {
    let configuration = Configuration::from_json_value(json!({
        "preloadHeroImage": { "preloadSrcset": true }
    }))
    .unwrap();
    assert!(configuration.preload_hero_image.preload_srcset);
}

#[test]
fn test_unknown_keys_are_rejected() {
    let result = Configuration::from_json_str(r#"{ "rewriteAmpUrls": { "ampUrlPrefx": "/amp" } }"#);
    assert!(matches!(result, Err(OptimizerError::Json(_))));

    let result = Configuration::from_json_str(r#"{ "minify": true }"#);
    assert!(matches!(result, Err(OptimizerError::Json(_))));
}

#[test]
fn test_unknown_transformer_is_rejected() {
    let error = Configuration::from_json_str(r#"{ "transformers": ["Minify"] }"#).unwrap_err();
    assert!(error.to_string().contains("unknown transformer 'Minify'"));
}

#[test]
fn test_wrong_value_type_is_rejected() {
    let result = Configuration::from_json_str(r#"{ "rewriteAmpUrls": { "lts": "yes" } }"#);
    assert!(matches!(result, Err(OptimizerError::Json(_))));
}

// ========== lookups ==========

#[test]
fn test_get_dotted_key() {
    let configuration = Configuration::default();
    assert_eq!(configuration.get("rewriteAmpUrls.ampUrlPrefix").unwrap(), json!(CACHE_HOST));
    assert_eq!(configuration.get("preloadHeroImage.preloadSrcset").unwrap(), json!(false));
    assert_eq!(configuration.get("transformers").unwrap()[0], json!("AmpBoilerplate"));
}

#[test]
fn test_get_unknown_key() {
    let configuration = Configuration::default();
    assert!(matches!(
        configuration.get("rewriteAmpUrls.missing"),
        Err(OptimizerError::UnknownConfigurationKey(key)) if key == "rewriteAmpUrls.missing"
    ));
    assert!(matches!(
        configuration.get("rewriteAmpUrls.lts.deeper"),
        Err(OptimizerError::UnknownConfigurationKey(_))
    ));
}

#[test]
fn test_transformer_configuration() {
    let configuration = Configuration::default();
    assert!(matches!(
        configuration.transformer_configuration(TransformerKind::RewriteAmpUrls),
        Ok(TransformerConfiguration::RewriteAmpUrls(section)) if section.esm_modules_enabled
    ));
    assert!(matches!(
        configuration.transformer_configuration(TransformerKind::ReorderHead),
        Err(OptimizerError::UnknownConfigurationClass(name)) if name == "ReorderHead"
    ));
}

#[test]
fn test_configuration_serializes_to_camel_case() {
    let value = serde_json::to_value(Configuration::default()).unwrap();
    assert!(value["ampRuntimeCss"].get("canary").is_some());
    assert!(value["rewriteAmpUrls"].get("esmModulesEnabled").is_some());
}
