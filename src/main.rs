// =============================================================================
// CARTORUST — Point d'entrée : démonstration du moteur de cartographie
// =============================================================================
//
// Ce main.rs montre un exemple complet :
//   1. Déclarer les règles d'un type hôte (Contact) contre son registre
//   2. Construire une instance à partir d'un payload JSON externe
//   3. Lire les vues mapped / unmapped et les accesseurs
//   4. Voir une déclaration contradictoire refusée
//   5. Voir une transformation qui échoue faire échouer la construction
//
// Les journaux passent par tracing : RUST_LOG=debug pour voir chaque règle.
//
// =============================================================================

use cartorust::core::record::{display_record, record_from_json};
use cartorust::{
    Attr, Cartograph, Cartographed, Declaration, Record, Reverse, SharedRegistry, Transform, Value,
};
use tracing_subscriber::EnvFilter;

/// Le type hôte : un contact venu d'un CRM aux clés en CamelCase.
struct Contact {
    cartograph: Cartograph<String, Value>,
}

static CONTACT_RULES: SharedRegistry<String, Value> = SharedRegistry::new();

impl Cartographed for Contact {
    type Key = String;
    type Value = Value;

    fn registry() -> &'static SharedRegistry<String, Value> {
        &CONTACT_RULES
    }

    fn from_cartograph(cartograph: Cartograph<String, Value>) -> Self {
        Contact { cartograph }
    }

    fn cartograph(&self) -> &Cartograph<String, Value> {
        &self.cartograph
    }
}

/// Un âge doit être un entier plausible ; tout le reste fait échouer la construction.
fn checked_age(value: &Value) -> anyhow::Result<Value> {
    match value {
        Value::Integer(age) if (0..150).contains(age) => Ok(Value::Integer(*age)),
        other => anyhow::bail!("âge invalide : {}", other),
    }
}

fn declare_contact_rules() -> Result<(), cartorust::DeclarationError> {
    CONTACT_RULES.declare_with(|r| {
        r.map_pair("FirstName".into(), "first_name".into())?
            .map_pair("LastName".into(), "last_name".into())?
            .map_pair_with("Email".into(), "email".into(), Transform::value(Value::downcase))?
            .map_set(
                ["Tags".to_string(), "Groups".to_string()],
                Transform::key_value(|k: &String, v: &Value| (k.to_lowercase(), v.downcase())),
            )?
            .declare(
                Declaration::pair("Initials".into(), "initials".into())
                    .with_transform(Transform::value(Value::split_chars))
                    .with_reverse(Reverse::distinct(Value::join)),
            )?
            .map_pair_with("Age".into(), "age".into(), Transform::try_value(checked_age))?;
        Ok(())
    })
}

fn print_attr(key: &str, attr: Attr<&Value>) {
    match attr {
        Attr::Present(v) => println!("  {} = {}", key, v),
        Attr::Absent => println!("  {} = (absent)", key),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("╔══════════════════════════════════════════════════╗");
    println!("║      CARTORUST — Cartographie d'attributs        ║");
    println!("╚══════════════════════════════════════════════════╝\n");

    // ═══════════════════════════════════════════════════════════
    // ÉTAPE 1 : Déclarer les règles du type
    // ═══════════════════════════════════════════════════════════
    println!("═══ ÉTAPE 1 : Règles de Contact ═══\n");

    declare_contact_rules()?;
    CONTACT_RULES.read(|r| println!("{}\n", r));

    // ═══════════════════════════════════════════════════════════
    // ÉTAPE 2 : Construire une instance (aller)
    // ═══════════════════════════════════════════════════════════
    println!("═══ ÉTAPE 2 : Payload CRM → Contact ═══\n");

    let payload = record_from_json(
        r#"{
            "FirstName": "Ada",
            "LastName": "Lovelace",
            "Email": "ADA@Example.ORG",
            "Tags": ["VIP", "Math"],
            "Initials": "AL",
            "Age": 36,
            "Address": { "City": "London" },
            "Unknown": 42
        }"#,
    )?;
    let contact = Contact::build(payload)?;

    println!("original : {}", display_record(contact.original_attributes()));
    println!("mapped   : {}", display_record(contact.mapped_attributes()));
    println!("\naccesseurs :");
    for key in ["first_name", "email", "tags", "initials", "age", "groups"] {
        match contact.attribute(&key.to_string()) {
            Ok(attr) => print_attr(key, attr),
            Err(err) => println!("  {} : {}", key, err),
        }
    }
    println!();

    // ═══════════════════════════════════════════════════════════
    // ÉTAPE 3 : Dans l'autre sens (retour)
    // ═══════════════════════════════════════════════════════════
    println!("═══ ÉTAPE 3 : Contact interne → forme CRM ═══\n");

    let internal: Record<String, Value> = Record::from([
        ("first_name".to_string(), Value::from("Grace")),
        ("last_name".to_string(), Value::from("Hopper")),
        ("email".to_string(), Value::from("grace@navy.mil")),
        ("initials".to_string(), Value::from(vec!["G", "H"])),
    ]);
    let contact = Contact::build(internal)?;
    println!("unmapped : {}", display_record(contact.unmapped_attributes()));
    println!("  (email est en aller simple : pas de retour vers Email)\n");

    // ═══════════════════════════════════════════════════════════
    // ÉTAPE 4 : Déclaration contradictoire
    // ═══════════════════════════════════════════════════════════
    println!("═══ ÉTAPE 4 : Déclaration refusée ═══\n");

    let rejected = CONTACT_RULES.declare(
        Declaration::pair("Phone".into(), "phone".into())
            .with_transform(Transform::key_value(|k: &String, v: &Value| (k.clone(), v.clone()))),
    );
    match rejected {
        Ok(()) => println!("✗ la déclaration aurait dû être refusée\n"),
        Err(err) => println!("✓ {}\n", err),
    }

    // ═══════════════════════════════════════════════════════════
    // ÉTAPE 5 : Transformation qui échoue
    // ═══════════════════════════════════════════════════════════
    println!("═══ ÉTAPE 5 : Construction qui échoue ═══\n");

    let bad = Record::from([("Age".to_string(), Value::from("quarante"))]);
    match Contact::build(bad) {
        Ok(_) => println!("✗ la construction aurait dû échouer"),
        Err(err) => println!("✓ aucune instance créée : {}", err),
    }

    println!("\n═══════════════════════════════════════════════════");
    CONTACT_RULES.read(|r| {
        println!(
            "  {} règles aller, {} règles retour",
            r.len(),
            r.reverse_rules().count()
        )
    });
    println!("═══════════════════════════════════════════════════");

    Ok(())
}
