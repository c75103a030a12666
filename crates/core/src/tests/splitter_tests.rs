// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::splitter::{clear_split, plan_split};
use crate::tests::helpers::{at_day, create_completed_donation, create_registered_donation};
use crate::{CoreError, SplitAllocation};
use hemolink_domain::{BloodComponent, BloodUnit, Donation, DomainError, UnitStatus};

#[test]
fn test_split_produces_one_unit_per_allocation() {
    let donation: Donation = create_completed_donation(1, 450);
    let allocations: Vec<SplitAllocation> = vec![
        SplitAllocation::new(BloodComponent::Plasma, 200),
        SplitAllocation::new(BloodComponent::RedCells, 250),
    ];

    let (units, split): (Vec<BloodUnit>, Donation) =
        plan_split(&donation, &allocations, at_day(2)).unwrap();

    assert_eq!(units.len(), 2);
    assert!(units.iter().all(|unit| unit.status == UnitStatus::Testing));
    assert!(units.iter().all(|unit| unit.donation_id == 1));
    assert!(units.iter().all(|unit| unit.id().is_none()));
    assert_eq!(units[0].component, BloodComponent::Plasma);
    assert_eq!(units[0].quantity_ml, 200);
    assert_eq!(units[1].component, BloodComponent::RedCells);
    assert_eq!(units[1].quantity_ml, 250);
    assert_eq!(split.split_at, Some(at_day(2)));
}

#[test]
fn test_shelf_life_counts_from_collection_not_split() {
    let donation: Donation = create_completed_donation(1, 450);
    let allocations: Vec<SplitAllocation> =
        vec![SplitAllocation::new(BloodComponent::Platelets, 300)];

    // The donation ended at day 1; splitting at day 3 changes nothing.
    let (units, _) = plan_split(&donation, &allocations, at_day(3)).unwrap();

    assert_eq!(units[0].collected_at, at_day(1));
    assert_eq!(units[0].expires_at, at_day(1) + BloodComponent::Platelets.shelf_life());
}

#[test]
fn test_over_allocation_is_refused() {
    let donation: Donation = create_completed_donation(1, 450);
    let allocations: Vec<SplitAllocation> = vec![
        SplitAllocation::new(BloodComponent::Plasma, 300),
        SplitAllocation::new(BloodComponent::RedCells, 250),
    ];

    let result = plan_split(&donation, &allocations, at_day(2));

    assert!(matches!(
        result,
        Err(CoreError::DomainViolation(DomainError::OverAllocation {
            collected_ml: 450,
            allocated_ml: 550,
        }))
    ));
}

#[test]
fn test_empty_and_zero_allocations_are_refused() {
    let donation: Donation = create_completed_donation(1, 450);

    assert!(matches!(
        plan_split(&donation, &[], at_day(2)),
        Err(CoreError::DomainViolation(DomainError::EmptyAllocation))
    ));
    assert!(matches!(
        plan_split(
            &donation,
            &[SplitAllocation::new(BloodComponent::Plasma, 0)],
            at_day(2)
        ),
        Err(CoreError::DomainViolation(DomainError::InvalidQuantity(_)))
    ));
}

#[test]
fn test_second_split_fails_with_already_split() {
    let donation: Donation = create_completed_donation(7, 450);
    let allocations: Vec<SplitAllocation> = vec![
        SplitAllocation::new(BloodComponent::Plasma, 200),
        SplitAllocation::new(BloodComponent::RedCells, 250),
    ];

    let (_, split): (Vec<BloodUnit>, Donation) =
        plan_split(&donation, &allocations, at_day(2)).unwrap();

    let second = plan_split(&split, &allocations, at_day(2));
    assert!(matches!(
        second,
        Err(CoreError::AlreadySplit { donation_id: 7 })
    ));

    // And keeps failing; the marker never clears on its own.
    let third = plan_split(&split, &allocations, at_day(3));
    assert!(matches!(
        third,
        Err(CoreError::AlreadySplit { donation_id: 7 })
    ));
}

#[test]
fn test_only_completed_donations_can_be_split() {
    let registered: Donation = create_registered_donation(1, 10);
    let allocations: Vec<SplitAllocation> =
        vec![SplitAllocation::new(BloodComponent::WholeBlood, 200)];

    let result = plan_split(&registered, &allocations, at_day(2));
    assert!(matches!(result, Err(CoreError::StateConflict { .. })));
}

#[test]
fn test_clear_split_reopens_the_donation_for_splitting() {
    let donation: Donation = create_completed_donation(1, 450);
    let allocations: Vec<SplitAllocation> =
        vec![SplitAllocation::new(BloodComponent::WholeBlood, 450)];

    let (_, split): (Vec<BloodUnit>, Donation) =
        plan_split(&donation, &allocations, at_day(2)).unwrap();
    let cleared: Donation = clear_split(&split).unwrap();
    assert!(!cleared.is_split());

    // Re-split succeeds after the void path cleared the marker.
    let again = plan_split(&cleared, &allocations, at_day(3));
    assert!(again.is_ok());
}

#[test]
fn test_clear_split_requires_a_prior_split() {
    let donation: Donation = create_completed_donation(1, 450);
    let result = clear_split(&donation);
    assert!(matches!(result, Err(CoreError::StateConflict { .. })));
}
