//! Intent-extras probes in front of activity starts.

mod common;

use common::*;
use nappa_instrument::dialect::DialectKind;
use nappa_instrument::types::{Concern, PayloadForm, SiteOutcome};

fn payload_forms(result: &nappa_instrument::InstrumentationResult) -> Vec<PayloadForm> {
    result
        .sites_for(Concern::IntentExtras)
        .filter_map(|site| match &site.outcome {
            SiteOutcome::Instrumented { payload_form, .. } => *payload_form,
            _ => None,
        })
        .collect()
}

#[test]
fn test_reference_and_constructed_payloads() {
    let source = r#"package com.example;

import android.content.Intent;

public class MainActivity extends Activity {
    void open() {
        Intent intent = new Intent(this, B.class);
        startActivity(intent);
    }

    void openInline() {
        startActivity(new Intent(this, C.class));
    }
}
"#;
    let (text, result) = instrument_extras(source, DialectKind::Java);

    assert!(text.contains(
        "        Nappa.notifyExtras(intent.getExtras());\n        startActivity(intent);"
    ));
    assert!(text.contains(
        "        Intent intent = new Intent(this, C.class);\n        Nappa.notifyExtras(intent.getExtras());\n        startActivity(intent);"
    ));
    assert!(text.contains(&format!("import android.content.Intent;\n{JAVA_IMPORT}")));
    assert_eq!(
        payload_forms(&result),
        vec![PayloadForm::VariableReference, PayloadForm::ConstructedValue]
    );
    assert_eq!(result.possible_count, 2);
    assert_eq!(result.instrumented_count, 2);
    assert!(result.processed_elements_count > 0);
}

#[test]
fn test_synthesized_name_avoids_existing_bindings() {
    let source = r#"import android.content.Intent;

public class MainActivity extends Activity {
    void open() {
        Intent intent = new Intent(this, B.class);
        Intent intent1 = new Intent(this, C.class);
        startActivity(new Intent(this, D.class));
    }
}
"#;
    let (text, _) = instrument_extras(source, DialectKind::Java);

    assert!(text.contains("Intent intent2 = new Intent(this, D.class);"));
    assert!(text.contains("Nappa.notifyExtras(intent2.getExtras());"));
    assert!(text.contains("startActivity(intent2);"));
}

#[test]
fn test_legacy_operations_read_second_argument() {
    let source = r#"import android.content.Intent;

public class HostActivity extends Activity {
    void open(Fragment fragment, Intent data) {
        startActivityFromFragment(fragment, data, 7);
    }
}
"#;
    let (text, _) = instrument_extras(source, DialectKind::Java);

    assert!(text.contains(
        "        Nappa.notifyExtras(data.getExtras());\n        startActivityFromFragment(fragment, data, 7);"
    ));
}

#[test]
fn test_lambda_body_is_encapsulated() {
    let source = r#"import android.content.Intent;

public class MainActivity extends Activity {
    void bind(Intent i) {
        button.setOnClickListener(v -> startActivity(i));
    }
}
"#;
    let (text, result) = instrument_extras(source, DialectKind::Java);

    assert!(text.contains(
        "v -> {\n            Nappa.notifyExtras(i.getExtras());\n            startActivity(i);\n        });"
    ));
    assert!(result.sites_for(Concern::IntentExtras).all(|site| matches!(
        site.outcome,
        SiteOutcome::Instrumented {
            encapsulated: true,
            ..
        }
    )));
}

#[test]
fn test_lambda_never_gains_a_return() {
    let source = r#"import android.content.Intent;

public class MainActivity extends Activity {
    void bind(Intent i) {
        button.setOnClickListener(v -> startActivityIfNeeded(i, 0));
    }
}
"#;
    let (text, _) = instrument_extras(source, DialectKind::Java);

    assert!(text.contains(
        "v -> {\n            Nappa.notifyExtras(i.getExtras());\n            startActivityIfNeeded(i, 0);\n        });"
    ));
    assert!(!text.contains("return"));
}

#[test]
fn test_switch_arms_are_encapsulated() {
    let source = r#"import android.content.Intent;

public class MainActivity extends Activity {
    void open(int x) {
        switch (x) {
            case 1 -> startActivity(new Intent(this, B.class));
            case 2 -> startActivity(new Intent(this, C.class));
        }
    }
}
"#;
    let (text, result) = instrument_extras(source, DialectKind::Java);

    assert!(text.contains("    void open(int x) {\n        switch (x) {\n            case 1 -> {"));
    assert!(text.contains(
        "            case 1 -> {\n                Intent intent = new Intent(this, B.class);\n                Nappa.notifyExtras(intent.getExtras());\n                startActivity(intent);\n            }"
    ));
    assert!(text.contains(
        "            case 2 -> {\n                Intent intent1 = new Intent(this, C.class);\n                Nappa.notifyExtras(intent1.getExtras());\n                startActivity(intent1);\n            }"
    ));
    assert_eq!(result.possible_count, 2);
    assert_eq!(result.instrumented_count, 2);
    assert_eq!(result.already_instrumented_count, 0);

    let (second, result) = instrument_extras(&text, DialectKind::Java);
    assert_eq!(second, text);
    assert_eq!(result.already_instrumented_count, 2);
}

#[test]
fn test_unbraced_branch_is_encapsulated() {
    let source = r#"import android.content.Intent;

public class MainActivity extends Activity {
    void open(boolean ok, Intent i) {
        if (ok) startActivity(i);
    }
}
"#;
    let (text, _) = instrument_extras(source, DialectKind::Java);

    assert!(text.contains(
        "if (ok) {\n            Nappa.notifyExtras(i.getExtras());\n            startActivity(i);\n        }"
    ));
}

#[test]
fn test_second_run_is_idempotent() {
    let source = r#"import android.content.Intent;

public class MainActivity extends Activity {
    void open(Intent i) {
        startActivity(new Intent(this, B.class));
        button.setOnClickListener(v -> startActivity(i));
    }
}
"#;
    let (first, result) = instrument_extras(source, DialectKind::Java);
    assert_eq!(result.instrumented_count, 2);

    let (second, result) = instrument_extras(&first, DialectKind::Java);
    assert_eq!(first, second);
    assert_eq!(result.instrumented_count, 0);
    assert_eq!(result.already_instrumented_count, 2);
    assert_eq!(second.matches(JAVA_IMPORT).count(), 1);
}

#[test]
fn test_call_without_payload_is_skipped() {
    let source = r#"import android.content.Intent;

public class MainActivity extends Activity {
    void open(Helper helper) {
        helper.startActivityFromChild(onlyOne);
    }
}
"#;
    let (text, result) = instrument_extras(source, DialectKind::Java);

    assert_eq!(text, source);
    assert_eq!(result.possible_count, 1);
    assert_eq!(result.instrumented_count, 0);
    assert!(
        result
            .sites_for(Concern::IntentExtras)
            .all(|s| matches!(s.outcome, SiteOutcome::Skipped { .. }))
    );
}

#[test]
fn test_files_without_intent_import_are_not_scanned() {
    let source = r#"public class MainActivity extends Activity {
    void open(Intent i) {
        startActivity(i);
    }
}
"#;
    let (text, result) = instrument_extras(source, DialectKind::Java);

    assert_eq!(text, source);
    assert_eq!(result.possible_count, 0);
}

#[test]
fn test_kotlin_reference_payload() {
    let source = r#"package com.example

import android.content.Intent

class MainActivity : AppCompatActivity() {
    fun open(intent: Intent) {
        startActivity(intent)
    }
}
"#;
    let (text, result) = instrument_extras(source, DialectKind::Kotlin);

    assert!(text.contains("        Nappa.notifyExtras(intent.extras)\n        startActivity(intent)"));
    assert!(text.contains(&format!("import android.content.Intent\n{KOTLIN_IMPORT}")));
    assert_eq!(payload_forms(&result), vec![PayloadForm::VariableReference]);
}

#[test]
fn test_kotlin_unbraced_branch_with_constructed_payload() {
    let source = r#"import android.content.Intent

class MainActivity : AppCompatActivity() {
    fun open(ok: Boolean) {
        if (ok) startActivity(Intent(this, B::class.java))
    }
}
"#;
    let (text, result) = instrument_extras(source, DialectKind::Kotlin);

    let declaration = text
        .find("val intent: Intent = Intent(this, B::class.java)")
        .unwrap();
    let probe = text.find("Nappa.notifyExtras(intent.extras)").unwrap();
    let call = text.find("startActivity(intent)").unwrap();
    assert!(text.contains("if (ok) {"));
    assert!(declaration < probe && probe < call);
    assert_eq!(payload_forms(&result), vec![PayloadForm::ConstructedValue]);
}

#[test]
fn test_kotlin_one_line_lambda_breaks_after_brace() {
    let source = r#"import android.content.Intent

class MainActivity : AppCompatActivity() {
    fun open(items: List<String>) {
        items.forEach { startActivity(Intent(this, B::class.java)) }
    }
}
"#;
    let (text, result) = instrument_extras(source, DialectKind::Kotlin);

    assert!(text.contains(
        "        items.forEach {\n            val intent: Intent = Intent(this, B::class.java)\n            Nappa.notifyExtras(intent.extras)\n            startActivity(intent) }"
    ));
    assert_eq!(result.instrumented_count, 1);
}
