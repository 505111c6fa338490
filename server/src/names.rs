use rand::Rng;
use rand::seq::SliceRandom;

const ADJECTIVES: &[&str] = &[
    "Swift", "Clever", "Brave", "Mighty", "Sneaky", "Lucky", "Fierce", "Quiet", "Bold", "Wild",
    "Happy", "Crafty", "Rapid", "Noble", "Stormy", "Cosmic",
];

const ANIMALS: &[&str] = &[
    "Tiger", "Falcon", "Otter", "Panda", "Wolf", "Badger", "Eagle", "Fox", "Lynx", "Shark",
    "Cobra", "Raven", "Bison", "Koala", "Gecko", "Moose",
];

const MAX_ATTEMPTS: usize = 1000;

fn candidate<R: Rng + ?Sized>(rng: &mut R) -> String {
    let adjective = ADJECTIVES.choose(rng).copied().unwrap_or("Swift");
    let animal = ANIMALS.choose(rng).copied().unwrap_or("Tiger");
    format!("{}{}{:02}", adjective, animal, rng.gen_range(0..100))
}

/// Generates a `<Adjective><Animal><NN>` name for which `is_taken` returns false.
///
/// Falls back to a numbered `Player` name if random draws keep colliding.
pub fn generate_name<R, F>(rng: &mut R, is_taken: F) -> String
where
    R: Rng + ?Sized,
    F: Fn(&str) -> bool,
{
    for _ in 0..MAX_ATTEMPTS {
        let name = candidate(rng);
        if !is_taken(&name) {
            return name;
        }
    }

    (1..)
        .map(|n| format!("Player{}", n))
        .find(|name| !is_taken(name))
        .unwrap_or_else(|| "Player".to_string())
}
