use serde_json::{Value, json};

use crate::{
    app::FormEngine,
    domain::{LeafField, SectionField, parse_form_config},
    presentation::{
        FieldRenderer, FlowView, LeafView, OutlineRenderer, RenderContext, RepeatableView,
        render_form,
    },
};

fn engine(config: Value) -> FormEngine {
    FormEngine::builder(parse_form_config(&config).expect("config")).mount()
}

fn account_form() -> Value {
    json!({
        "title": "Account",
        "description": "Create your account.",
        "fields": [
            {"name": "fullName", "label": "Full name",
             "validation": {"required": {"value": true, "message": "Name is required"}}},
            {"name": "password", "type": "password", "label": "Password", "showPasswordStrength": true},
            {"name": "plan", "type": "radio", "label": "Plan",
             "options": [{"value": "free", "label": "Free"}, {"value": "pro", "label": "Pro"}]},
            {"name": "coupon", "label": "Coupon",
             "showWhen": {"conditions": [{"field": "plan", "operator": "eq", "value": "pro"}]}},
            {"name": "avatar", "type": "signature", "label": "Avatar"},
            {"type": "repeatable", "name": "emails", "label": "Emails", "maxItems": 2,
             "fields": [{"name": "address", "label": "Address"}]}
        ]
    })
}

#[test]
fn outline_lists_visible_fields_and_errors() {
    let mut engine = engine(account_form());
    engine.validate_all();
    let text = OutlineRenderer::new(60).render(&engine);

    assert!(text.starts_with("Account\n======="), "{text}");
    assert!(text.contains("Full name *: -"), "{text}");
    assert!(text.contains("! Name is required"), "{text}");
    assert!(text.contains("options: Free | Pro"), "{text}");
    assert!(text.contains("Avatar: [unsupported field type 'signature']"), "{text}");
    assert!(text.contains("[Add item]"), "{text}");
    assert!(!text.contains("Coupon"), "hidden fields are not rendered");
    assert!(text.contains("[Submit]"));
    assert!(text.ends_with("Ready."), "validation alone leaves the status untouched");
}

#[test]
fn outline_masks_passwords_until_revealed() {
    let mut engine = engine(account_form());
    engine.set_value("password", json!("Abc1!")).expect("password");
    engine.set_value("plan", json!("pro")).expect("plan");

    let masked = OutlineRenderer::default().render(&engine);
    assert!(masked.contains("Password: *****"), "{masked}");
    assert!(masked.contains("strength: Strong (4/5)"), "{masked}");
    assert!(masked.contains("Plan: Pro"), "{masked}");
    assert!(masked.contains("Coupon: -"), "{masked}");

    engine.toggle_password_visibility("password");
    let revealed = OutlineRenderer::default().render(&engine);
    assert!(revealed.contains("Password: Abc1!"), "{revealed}");
}

#[test]
fn wizard_outline_shows_the_current_step_only() {
    let engine = engine(json!({
        "title": "Trip",
        "type": "wizard",
        "steps": [
            {"id": "where", "title": "Destination", "fields": ["city"]},
            {"id": "when", "title": "Dates", "fields": ["start"]}
        ],
        "fields": [
            {"name": "city", "label": "City"},
            {"name": "start", "type": "date", "label": "Start"}
        ]
    }));
    let text = OutlineRenderer::default().render(&engine);
    assert!(text.contains("Step 1 of 2: Destination"), "{text}");
    assert!(text.contains("City: -"));
    assert!(!text.contains("Start"));
    assert!(text.contains("[Next]"));
}

/// Collects canonical leaf paths to check what the dispatcher hands out.
#[derive(Default)]
struct PathCollector;

impl FieldRenderer for PathCollector {
    type Output = Vec<String>;

    fn leaf(&mut self, view: LeafView<'_>) -> Vec<String> {
        vec![view.path]
    }

    fn unsupported(&mut self, field: &LeafField, _context: &RenderContext) -> Vec<String> {
        vec![format!("?{}", field.name)]
    }

    fn section(
        &mut self,
        _section: &SectionField,
        _context: &RenderContext,
        children: Vec<Vec<String>>,
    ) -> Vec<String> {
        children.into_iter().flatten().collect()
    }

    fn repeatable(&mut self, view: RepeatableView<'_>, items: Vec<Vec<Vec<String>>>) -> Vec<String> {
        let mut paths = vec![view.path];
        paths.extend(items.into_iter().flatten().flatten());
        paths
    }

    fn flow(&mut self, view: FlowView<'_>) -> Vec<String> {
        vec![view.path]
    }
}

#[test]
fn dispatch_threads_canonical_paths_through_items() {
    let mut form = engine(account_form());
    form.add_item("emails").expect("add");
    form.add_item("emails").expect("add");
    let paths: Vec<String> = render_form(&form, &mut PathCollector)
        .into_iter()
        .flatten()
        .collect();
    assert_eq!(
        paths,
        vec![
            "fullName",
            "password",
            "plan",
            "?avatar",
            "emails",
            "emails[0].address",
            "emails[1].address",
        ]
    );
}
