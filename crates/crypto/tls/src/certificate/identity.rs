//! Information found in either the issuer or subject sections of an x509 certificate

use crate::der;

use super::{expect_next_item, expect_type, Error};

use std::collections::HashSet;

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum Property {
    Country(String),
    Organization(String),
    OrganizationalUnit(String),
    DistinguishedName(String),
    StateOrProvince(String),
    CommonName(String),
    SerialNumber(String),
}

/// The identity of a party
///
/// In spec-terms, this is a set of RelativeDistinguishedNames
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub properties: HashSet<Property>,
}

impl der::Parse for Identity {
    type Error = Error;

    fn try_from_item(item: der::Item<'_>) -> Result<Self, Self::Error> {
        let rdn_sequence = expect_type!(item, Sequence)?;

        let mut properties = HashSet::new();
        for relative_distinguished_name in rdn_sequence {
            let mut attribute_set = expect_type!(relative_distinguished_name?, Set)?;

            let attribute_type_and_value = expect_next_item!(attribute_set)?;
            let mut attribute_type_and_value = expect_type!(attribute_type_and_value, Sequence)?;

            let key = expect_type!(expect_next_item!(attribute_type_and_value)?, ObjectIdentifier)?;
            let value_item = expect_next_item!(attribute_type_and_value)?;
            let value = parse_directory_string(value_item)?;

            if attribute_type_and_value.next().is_some() {
                return Err(Error::TrailingBytes);
            }

            let property = match key {
                der::ObjectIdentifier::CountryName => Property::Country(value),
                der::ObjectIdentifier::OrganizationName => Property::Organization(value),
                der::ObjectIdentifier::OrganizationalUnitName => Property::OrganizationalUnit(value),
                der::ObjectIdentifier::DistinguishedName => Property::DistinguishedName(value),
                der::ObjectIdentifier::StateOrProvinceName => Property::StateOrProvince(value),
                der::ObjectIdentifier::CommonName => Property::CommonName(value),
                der::ObjectIdentifier::SerialNumber => Property::SerialNumber(value),
                // Attributes we don't have a dedicated slot for are simply not recorded.
                _ => continue,
            };

            if attribute_set.next().is_some() {
                return Err(Error::TrailingBytes);
            }

            properties.insert(property);
        }

        Ok(Self { properties })
    }
}

/// `DirectoryString ::= CHOICE { teletexString, printableString, universalString, utf8String, bmpString }`
///
/// Only the two variants actually emitted by certificates we've seen in
/// practice are supported; everything else is rejected rather than silently
/// dropped, since an attribute value we can't read is not the same as an
/// attribute that's absent.
fn parse_directory_string(item: der::Item<'_>) -> Result<String, Error> {
    match item {
        der::Item::Utf8String(s) => Ok(s),
        der::Item::PrintableString(s) => Ok(s.to_string()),
        _ => Err(Error::InvalidFormat),
    }
}
