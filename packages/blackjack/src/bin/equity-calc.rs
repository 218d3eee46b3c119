use blackjack::{calculate_hand_value, EquityCalculator, GameRules, Rank, ShoeComposition};
use clap::Parser;

const MAX_DECKS: u32 = 20;

#[derive(Parser)]
#[command(
    name = "equity-calc",
    about = "Compare hit and stand for a hand against the remaining shoe"
)]
struct Args {
    /// Player cards, comma separated (e.g. "A,7")
    #[arg(long, value_delimiter = ',', required = true)]
    player: Vec<Rank>,

    /// Dealer upcard
    #[arg(long)]
    dealer: Rank,

    /// Other cards known to be out of the shoe, comma separated
    #[arg(long, value_delimiter = ',')]
    seen: Vec<Rank>,

    /// Number of decks in the shoe (1-20)
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=MAX_DECKS as i64))]
    decks: u32,

    /// Dealer hits soft 17
    #[arg(long, default_value_t = false, action = clap::ArgAction::Set)]
    dealer_hits_soft_17: bool,

    /// Dealer peeks for blackjack
    #[arg(long, default_value_t = false, action = clap::ArgAction::Set)]
    dealer_peeks: bool,
}

fn main() {
    let args = Args::parse();

    let rules = GameRules {
        dealer_hits_soft_17: args.dealer_hits_soft_17,
        dealer_peeks: args.dealer_peeks,
    };

    let mut shoe = ShoeComposition::full(args.decks);
    shoe.remove_dealt(&args.player);
    shoe.remove_dealt(&[args.dealer]);
    shoe.remove_dealt(&args.seen);

    let show = |cards: &[Rank]| {
        cards
            .iter()
            .map(Rank::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    };

    eprintln!("Configuration:");
    eprintln!("  Decks:          {}", args.decks);
    eprintln!(
        "  Dealer soft 17: {}",
        if rules.dealer_hits_soft_17 {
            "hits"
        } else {
            "stands"
        }
    );
    eprintln!("  Dealer peeks:   {}", rules.dealer_peeks);
    eprintln!(
        "  Player:         {} ({})",
        show(&args.player),
        calculate_hand_value(&args.player)
    );
    eprintln!("  Dealer upcard:  {}", args.dealer);
    eprintln!("  Seen:           {}", show(&args.seen));
    eprintln!("  Cards left:     {}", shoe.total());
    eprintln!("Calculating...");

    let equity = EquityCalculator::new(rules).decide(&args.player, args.dealer, &shoe);

    println!("Hit equity:    {:.4}%", equity.hit * 100.0);
    println!("Stand equity:  {:.4}%", equity.stand * 100.0);
    // Ties go to standing
    if equity.hit > equity.stand {
        println!("Recommended: Hit");
    } else {
        println!("Recommended: Stand");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decks_bounded() {
        let parse = |decks: &str| {
            Args::try_parse_from(["equity-calc", "--player", "A,7", "--dealer", "9", "--decks", decks])
        };
        assert_eq!(parse("20").unwrap().decks, 20);
        assert!(parse("0").is_err());
        assert!(parse("21").is_err());
        assert!(parse("4294967295").is_err());
    }

    #[test]
    fn test_defaults_to_one_deck() {
        let args = Args::try_parse_from(["equity-calc", "--player", "10,6", "--dealer", "T"]).unwrap();
        assert_eq!(args.decks, 1);
        assert_eq!(args.player, vec![Rank::Ten, Rank::Six]);
        assert_eq!(args.dealer, Rank::Ten);
        assert!(!args.dealer_hits_soft_17);
    }
}
