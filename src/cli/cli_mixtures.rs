use super::cli_main::{get_user_input, prompt};
use crate::Storage::mixture_store::MixtureStore;
use prettytable::{Table, row};

pub fn saved_mixtures_menu(store: &mut MixtureStore) {
    loop {
        println!("\n=== Saved mixtures ({}) ===", store.mode().as_str());
        println!("1. Refresh list");
        println!("2. Delete one");
        println!("3. Clear all");
        println!("0. Back to main menu");
        prompt("Enter your choice: ");

        let choice = get_user_input();
        match choice.trim() {
            "1" => {
                store.load();
                print_saved(store);
            }
            "2" => {
                print_saved(store);
                prompt("Mixture id: ");
                let id = get_user_input();
                match store.delete(id.trim()) {
                    Ok(()) => println!("Deleted."),
                    Err(e) => println!("\x1b[31mDelete failed: {}\x1b[0m", e),
                }
            }
            "3" => {
                prompt("Type 'yes' to delete every saved mixture: ");
                if get_user_input().trim() != "yes" {
                    continue;
                }
                match store.clear_all() {
                    Ok(n) => println!("Removed {} mixtures.", n),
                    Err(e) => println!("\x1b[31mClear failed: {}\x1b[0m", e),
                }
            }
            "0" => break,
            _ => println!("Invalid choice. Please try again."),
        }
    }
}

fn print_saved(store: &MixtureStore) {
    if store.recent().is_empty() {
        println!("No saved mixtures.");
        return;
    }
    let mut table = Table::new();
    table.add_row(row!["id", "Name", "Colour", "Saved at"]);
    for mixture in store.recent() {
        table.add_row(row![
            mixture.id,
            mixture.name,
            mixture.color,
            mixture.created_at.format("%Y-%m-%d %H:%M:%S")
        ]);
    }
    table.printstd();
}
