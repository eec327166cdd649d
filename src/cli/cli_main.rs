use super::cli_mixtures::saved_mixtures_menu;
use crate::Chemistry::chemicals::{Chemical, ChemicalRegistry, PhysicalState};
use crate::Chemistry::custom_chemicals::{
    ChemicalAdvisor, CustomChemicalRequest, GenerativeAdvisor, synthesize,
};
use crate::Chemistry::mixture_resolver::{MixtureResolver, Selection};
use crate::Chemistry::reactions::ReactionTable;
use crate::Storage::mixture_store::MixtureStore;
use crate::settings::LabConfig;
use log::{info, warn};
use prettytable::{Table, row};
use std::error::Error;
use std::io::{self, Write};
use std::sync::Arc;

/// Everything the bench needs between two menu choices
pub struct LabSession {
    pub registry: ChemicalRegistry,
    pub resolver: MixtureResolver,
    pub beaker: Selection,
    pub store: MixtureStore,
    advisor: Option<GenerativeAdvisor>,
}

impl LabSession {
    pub fn from_config(config: &LabConfig) -> Result<Self, Box<dyn Error>> {
        let registry = match &config.chemicals_file {
            Some(path) => ChemicalRegistry::from_json_file(path)?,
            None => ChemicalRegistry::builtin()?,
        };
        let reactions = match &config.reactions_file {
            Some(path) => ReactionTable::from_json_file(path)?,
            None => ReactionTable::builtin()?,
        };
        let unknown = reactions.validate_against(&registry);
        if !unknown.is_empty() {
            warn!("Reactions mention unknown chemicals: {:?}", unknown);
        }
        let resolver = MixtureResolver::with_settings(Arc::new(reactions), config.beaker);
        let advisor = match config.ai_api_key() {
            Some(key) => match GenerativeAdvisor::new(key, &config.ai_model) {
                Ok(advisor) => Some(advisor),
                Err(e) => {
                    warn!("AI advisor disabled: {}", e);
                    None
                }
            },
            None => None,
        };
        let mut store = MixtureStore::from_config(config)?;
        store.load();
        info!(
            "Lab ready: {} chemicals, {} reactions, {} storage",
            registry.len(),
            resolver.reactions().len(),
            store.mode().as_str()
        );
        let beaker = resolver.reset();
        Ok(Self {
            registry,
            resolver,
            beaker,
            store,
            advisor,
        })
    }

    /// Pours a catalog chemical into the beaker; `None` for unknown ids.
    pub fn add_by_id(&mut self, id: &str) -> Option<&Selection> {
        let chemical = self.registry.get(id)?.clone();
        self.pour(chemical);
        Some(&self.beaker)
    }

    pub fn add_custom(&mut self, request: &CustomChemicalRequest) -> Chemical {
        let advisor = self.advisor.as_ref().map(|a| a as &dyn ChemicalAdvisor);
        let chemical = synthesize(request, advisor);
        self.pour(chemical.clone());
        chemical
    }

    fn pour(&mut self, chemical: Chemical) {
        let beaker = std::mem::replace(&mut self.beaker, self.resolver.reset());
        self.beaker = self.resolver.add_chemical(beaker, chemical);
    }

    pub fn reset(&mut self) {
        self.beaker = self.resolver.reset();
    }
}

pub fn run_interactive_menu(config: &LabConfig) {
    let mut session = match LabSession::from_config(config) {
        Ok(session) => session,
        Err(e) => {
            println!("\x1b[31mCould not set up the lab: {}\x1b[0m", e);
            return;
        }
    };
    loop {
        show_main_menu(&session);
        let choice = get_user_input();

        match choice.trim() {
            "1" => print_catalog(&session.registry),
            "2" => add_chemical_menu(&mut session),
            "3" => add_custom_menu(&mut session),
            "4" => print_beaker(&session.beaker),
            "5" => {
                session.reset();
                println!("Beaker emptied.");
            }
            "6" => match session.store.save_selection(&session.beaker) {
                Ok(mixture) => println!("Saved '{}' ({})", mixture.name, mixture.id),
                Err(e) => println!("\x1b[31mSave failed: {}\x1b[0m", e),
            },
            "7" => saved_mixtures_menu(&mut session.store),
            "0" => {
                println!("Goodbye!");
                break;
            }
            _ => println!("Invalid choice. Please try again."),
        }
    }
}

fn show_main_menu(session: &LabSession) {
    println!(
        "\x1b[34m\n Virtual Science Lab: mix chemicals, watch reactions \n storage: {} \n\x1b[0m",
        session.store.mode().as_str()
    );
    println!("\x1b[33m1. List chemicals\x1b[0m");
    println!("\x1b[33m2. Add chemical\x1b[0m");
    println!("\x1b[33m3. Add custom chemical\x1b[0m");
    println!("\x1b[33m4. Show beaker\x1b[0m");
    println!("\x1b[33m5. Reset beaker\x1b[0m");
    println!("\x1b[33m6. Save mixture\x1b[0m");
    println!("\x1b[33m7. Saved mixtures\x1b[0m");
    println!("\x1b[33m0. Exit\x1b[0m");
    prompt("Enter your choice: ");
}

fn print_catalog(registry: &ChemicalRegistry) {
    let mut table = Table::new();
    table.add_row(row!["id", "Name", "Formula", "Colour", "State", "pH"]);
    for chemical in registry.iter() {
        table.add_row(row![
            chemical.id,
            chemical.name,
            chemical.display_formula(),
            chemical.color,
            chemical.state.as_str(),
            chemical.ph.map(|ph| format!("{:.1}", ph)).unwrap_or_default()
        ]);
    }
    table.printstd();
}

fn add_chemical_menu(session: &mut LabSession) {
    prompt("Chemical id: ");
    let id = get_user_input();
    let id = id.trim();
    match session.add_by_id(id) {
        Some(beaker) => print_beaker(beaker),
        None => println!("No chemical with id '{}'", id),
    }
}

fn add_custom_menu(session: &mut LabSession) {
    prompt("Name: ");
    let name = get_user_input().trim().to_string();
    if name.is_empty() {
        println!("A custom chemical needs a name.");
        return;
    }
    let mut request = CustomChemicalRequest::named(&name);
    request.formula = optional_input("Formula (empty to ask the advisor): ");
    request.color = optional_input("Colour #rrggbb (empty to ask the advisor): ");
    request.state = optional_input("State solid/liquid/gas (empty to ask the advisor): ")
        .and_then(|s| PhysicalState::parse(&s));
    request.ph = optional_input("pH (empty to ask the advisor): ").and_then(|s| s.parse().ok());

    let chemical = session.add_custom(&request);
    println!(
        "Added {} ({}, {}, {})",
        chemical.name,
        chemical.display_formula(),
        chemical.color,
        chemical.state.as_str()
    );
    print_beaker(&session.beaker);
}

pub(crate) fn print_beaker(beaker: &Selection) {
    if beaker.is_empty() {
        println!("The beaker is empty.");
        return;
    }
    let update = beaker.render_update();
    let color = beaker.color;
    println!(
        "\x1b[48;2;{};{};{}m      \x1b[0m {}  {}  level {:.1}",
        color.r,
        color.g,
        color.b,
        beaker.name(),
        update.color,
        update.level
    );
    if let (Some(description), Some(effect)) = (&update.reaction_description, update.effect) {
        println!("\x1b[35mReaction ({}): {}\x1b[0m", effect.as_str(), description);
    }
    if let Some(flame) = update.flame {
        println!("\x1b[31mFlammable mixture, flame: {:?}\x1b[0m", flame);
    }
}

fn optional_input(message: &str) -> Option<String> {
    prompt(message);
    let value = get_user_input().trim().to_string();
    if value.is_empty() { None } else { Some(value) }
}

pub(crate) fn prompt(message: &str) {
    print!("\x1b[36m{}\x1b[0m", message);
    let _ = io::stdout().flush();
}

/// Reads one line; end of input reads as "0" so every menu can exit.
pub(crate) fn get_user_input() -> String {
    let mut input = String::new();
    match io::stdin().read_line(&mut input) {
        Ok(0) | Err(_) => "0".to_string(),
        Ok(_) => input,
    }
}
