/// Property-based tests using proptest
/// Tests invariants that should hold for all inputs
use proptest::prelude::*;
use lead_capture_api::validators::{
    all_same, digits, is_valid_business_id, is_valid_email, is_valid_phone, mask_business_id,
    mask_phone,
};
use lead_capture_api::wizard::WizardSession;
use lead_capture_api::wizard_models::{
    next_step, Branch, ChoiceField, LeadType, StepId, TextField,
};

/// Appends the two check digits to a 12-digit CNPJ base
fn with_check_digits(base: &[u32]) -> String {
    fn dv(digits: &[u32], weights: &[u32]) -> u32 {
        let r = digits.iter().zip(weights).map(|(d, w)| d * w).sum::<u32>() % 11;
        if r < 2 {
            0
        } else {
            11 - r
        }
    }
    let mut d = base.to_vec();
    d.push(dv(&d, &[5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2]));
    d.push(dv(&d, &[6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2]));
    d.iter().map(|x| char::from_digit(*x, 10).unwrap()).collect()
}

// Property: validators and masks never panic
proptest! {
    #[test]
    fn validators_never_panic(input in "\\PC*") {
        let _ = is_valid_business_id(&input);
        let _ = is_valid_phone(&input);
        let _ = is_valid_email(&input, true);
        let _ = is_valid_email(&input, false);
        let _ = mask_business_id(&input);
        let _ = mask_phone(&input);
    }

    #[test]
    fn business_id_mask_idempotent(input in "[0-9./ -]{0,30}") {
        let once = mask_business_id(&input);
        prop_assert_eq!(mask_business_id(&once), once.clone());
        prop_assert!(digits(&once).len() <= 14);
    }

    #[test]
    fn phone_mask_idempotent(input in "[0-9() -]{0,20}") {
        let once = mask_phone(&input);
        prop_assert_eq!(mask_phone(&once), once.clone());
        prop_assert!(digits(&once).len() <= 11);
    }

    #[test]
    fn mask_keeps_digit_prefix(input in "[0-9]{0,20}") {
        let masked = mask_business_id(&input);
        let kept = digits(&masked);
        prop_assert!(input.starts_with(&kept));
    }
}

// Property: repeated-digit numbers are always rejected
proptest! {
    #[test]
    fn repeated_digit_phones_rejected(d in 0u32..=9, len in 10usize..=11) {
        let c = char::from_digit(d, 10).unwrap();
        let phone: String = std::iter::repeat(c).take(len).collect();
        prop_assert!(all_same(&phone));
        prop_assert!(!is_valid_phone(&phone));
        prop_assert!(!is_valid_phone(&mask_phone(&phone)));
    }

    #[test]
    fn repeated_digit_business_ids_rejected(d in 0u32..=9) {
        let c = char::from_digit(d, 10).unwrap();
        let id: String = std::iter::repeat(c).take(14).collect();
        prop_assert!(!is_valid_business_id(&id));
    }
}

// Property: generated CNPJs validate, single-digit changes break them
proptest! {
    #[test]
    fn generated_business_ids_validate(base in proptest::collection::vec(0u32..=9, 12)) {
        let id = with_check_digits(&base);
        prop_assume!(!all_same(&id));
        prop_assert!(is_valid_business_id(&id));
        prop_assert!(is_valid_business_id(&mask_business_id(&id)));
    }

    #[test]
    fn check_digit_mutation_rejected(
        base in proptest::collection::vec(0u32..=9, 12),
        position in 12usize..14,
        delta in 1u32..=9
    ) {
        let id = with_check_digits(&base);
        let mut chars: Vec<char> = id.chars().collect();
        let original = chars[position].to_digit(10).unwrap();
        chars[position] = char::from_digit((original + delta) % 10, 10).unwrap();
        let mutated: String = chars.into_iter().collect();
        prop_assert!(!is_valid_business_id(&mutated));
    }

    #[test]
    fn mobile_numbers_validate(ddd in 11u32..=99, rest in 10_000_000u32..=99_999_999) {
        let phone = format!("{}9{}", ddd, rest);
        prop_assume!(!all_same(&phone));
        prop_assert!(is_valid_phone(&phone));
        prop_assert!(is_valid_phone(&mask_phone(&phone)));
    }
}

// Property: the step sequence is strictly increasing and terminates
proptest! {
    #[test]
    fn transitions_strictly_increase(lead in prop_oneof![
        Just(LeadType::Business),
        Just(LeadType::Agent),
        Just(LeadType::Individual)
    ]) {
        let branch = lead.branch();
        let mut step = StepId::LeadType;
        let mut seen = vec![step];
        while let Some(next) = next_step(branch, step) {
            prop_assert!(branch.position(next) > branch.position(step));
            step = next;
            seen.push(step);
            prop_assert!(seen.len() <= branch.total_steps());
        }
        prop_assert_eq!(step, branch.terminal_step());
        prop_assert_eq!(seen.as_slice(), branch.steps());
    }

    #[test]
    fn lead_type_switches_keep_session_consistent(switches in proptest::collection::vec(0u8..3, 0..12)) {
        let mut session = WizardSession::new();
        session.set_text(TextField::FullName, "Ana Silva").unwrap();
        session.set_text(TextField::BusinessId, "11222333000181").unwrap();

        for s in switches {
            let lead = match s {
                0 => LeadType::Business,
                1 => LeadType::Agent,
                _ => LeadType::Individual,
            };
            session.select_lead_type(lead);
            let _ = session.advance(StepId::LeadType);
            let _ = session.select(ChoiceField::InitialVolume, "Até R$2.000,00");

            let branch = session.branch().unwrap();
            // only steps of the active branch stay revealed
            for step in session.visible_steps() {
                prop_assert!(branch.contains(step));
            }
            let other = if branch == Branch::B2b { Branch::B2c } else { Branch::B2b };
            for step in other.steps() {
                if !branch.contains(*step) {
                    prop_assert!(!session.is_visible(*step));
                }
            }
            if lead != LeadType::Business {
                prop_assert_eq!(session.values().choice(ChoiceField::InitialVolume), None);
            }
            let pct = session.progress_percent();
            prop_assert!((5..=100).contains(&pct));
        }

        // free text survives every switch
        prop_assert_eq!(session.values().text(TextField::FullName), "Ana Silva");
        prop_assert_eq!(session.values().text(TextField::BusinessId), "11.222.333/0001-81");
    }
}
