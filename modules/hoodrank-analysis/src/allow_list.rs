/// Neighborhoods the aggregator reports on. Matching is exact and
/// case-sensitive; anything else (including "Unknown") is dropped.
pub const MANHATTAN_NEIGHBORHOODS: [&str; 32] = [
    "Midtown East",
    "Midtown West",
    "Hell's Kitchen",
    "Chelsea",
    "Flatiron District",
    "Gramercy",
    "Murray Hill",
    "Kips Bay",
    "East Village",
    "West Village",
    "Greenwich Village",
    "SoHo",
    "NoHo",
    "Tribeca",
    "Financial District",
    "Lower East Side",
    "Chinatown",
    "Little Italy",
    "Upper East Side",
    "Upper West Side",
    "Harlem",
    "East Harlem",
    "Washington Heights",
    "Inwood",
    "NoMad",
    "Koreatown",
    "Nolita",
    "Battery Park City",
    "Morningside Heights",
    "Central Park South",
    "Theater District",
    "Garment District",
];

pub fn is_manhattan(hood: &str) -> bool {
    MANHATTAN_NEIGHBORHOODS.contains(&hood)
}
